//! Blogsmith — Binary Entrypoint
//! Runs one topic-to-article pipeline: collect information about the topic,
//! synthesize an article, save the markdown report, print a summary.
//!
//! Usage: `blogsmith <topic> [audience] [tone]`
//! Requires `PERPLEXITY_API_KEY` (a `.env` file is honored).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blogsmith::{report, DynAnswerClient, Pipeline, RunState, ScoringConfig, SonarClient};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blogsmith=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn print_summary(state: &RunState) {
    let summary = state.summary();
    println!("==================================================");
    println!("blog drafting result");
    println!("==================================================");
    println!("topic:      {}", summary.topic);
    println!("status:     {}", summary.status.label());
    println!("progress:   {}%", summary.progress);
    println!("sources:    {}", summary.sources_collected);
    if let Some(article) = &state.generated_article {
        println!("title:      {}", article.title);
        println!("words:      {}", article.word_count);
        println!("read time:  {} min", article.estimated_read_time);
        println!("category:   {}", article.category);
    }
    if let Some(t) = summary.started_at {
        println!("started:    {}", t.to_rfc3339());
    }
    if let Some(t) = summary.completed_at {
        println!("completed:  {}", t.to_rfc3339());
    }
    for error in &state.errors {
        println!("error:      {error}");
    }
    println!("==================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut args = std::env::args().skip(1);
    let topic = args
        .next()
        .context("usage: blogsmith <topic> [audience] [tone]")?;
    let audience = args.next().unwrap_or_else(|| "general readers".to_string());
    let tone = args
        .next()
        .unwrap_or_else(|| "friendly and informative".to_string());

    let config = ScoringConfig::load_default()?;
    let client: DynAnswerClient = Arc::new(SonarClient::from_env()?);
    let pipeline = Pipeline::new(client, config);

    let state = pipeline.run(&topic, &audience, &tone).await;
    print_summary(&state);

    if state.generated_article.is_some() {
        let path = report::save(&state, Path::new("output"))?;
        println!("saved: {}", path.display());
    }
    anyhow::ensure!(!state.is_failed(), "pipeline run failed");
    Ok(())
}
