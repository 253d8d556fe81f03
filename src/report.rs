// src/report.rs
// Renders a finished run into a human-readable markdown document and
// persists it under the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::state::RunState;

/// Render the run as a markdown document: article metadata, full body, the
/// per-type source counts, and the trailing log/error transcript.
pub fn render_markdown(state: &RunState) -> Result<String> {
    let article = state
        .generated_article
        .as_ref()
        .context("run has no generated article to render")?;

    let mut out = format!("# {}\n\n", article.title);
    out.push_str(&format!(
        "**Generated**: {}\n**Topic**: {}\n**Audience**: {}\n**Tone**: {}\n\
         **Estimated read time**: {} min\n**Word count**: {}\n\n---\n\n",
        state
            .completed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string()),
        state.topic,
        state.target_audience,
        state.tone,
        article.estimated_read_time,
        article.word_count,
    ));

    out.push_str("## Metadata\n\n");
    out.push_str(&format!("- **Category**: {}\n", article.category));
    out.push_str(&format!("- **Tags**: {}\n", article.meta_tags.join(", ")));
    out.push_str(&format!("- **Keywords**: {}\n\n---\n\n", article.keywords.join(", ")));

    out.push_str("## Body\n");
    out.push_str(&article.content);
    out.push_str("\n\n---\n\n## Run details\n\n");

    if let Some(collected) = &state.collected_content {
        out.push_str("### Collected sources\n");
        out.push_str(&format!("- **Total**: {}\n", collected.total_sources));
        out.push_str(&format!("- **Basic concepts**: {}\n", collected.basic_concepts.len()));
        out.push_str(&format!("- **Latest trends**: {}\n", collected.latest_trends.len()));
        out.push_str(&format!("- **Expert opinions**: {}\n\n", collected.expert_opinions.len()));
    }

    out.push_str("### Log\n");
    for log in &state.logs {
        out.push_str(&format!("- {log}\n"));
    }
    if !state.errors.is_empty() {
        out.push_str("\n### Errors\n");
        for error in &state.errors {
            out.push_str(&format!("- {error}\n"));
        }
    }

    Ok(out)
}

/// Write the rendered report to `<dir>/blog_<topic>_<timestamp>.md`.
pub fn save(state: &RunState, dir: &Path) -> Result<PathBuf> {
    let content = render_markdown(state)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let filename = format!(
        "blog_{}_{}.md",
        safe_topic_slug(&state.topic),
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(filename);
    fs::write(&path, content).with_context(|| format!("writing report to {}", path.display()))?;

    info!(path = %path.display(), "report saved");
    Ok(path)
}

/// Keep alphanumerics, dashes and underscores; spaces become underscores;
/// capped at 50 chars.
fn safe_topic_slug(topic: &str) -> String {
    topic
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
        .chars()
        .take(50)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BlogArticle, BlogSection, CollectedContent};

    fn finished_state() -> RunState {
        let mut state = RunState::new("coffee brewing", "hobbyists", "friendly");
        let mut article = BlogArticle::new("Brewing Better Coffee");
        article.add_section(BlogSection {
            title: "Intro".into(),
            content: "body text".into(),
            section_type: "intro".into(),
            image_placeholder: None,
        });
        article.recount(300);
        article.meta_tags = vec!["coffee".into()];
        article.keywords = vec!["brewing".into()];
        state.generated_article = Some(article);
        state.collected_content = Some(CollectedContent::new("coffee brewing"));
        state.add_log("collection done");
        state
    }

    #[test]
    fn rendered_report_embeds_article_and_transcript() {
        let state = finished_state();
        let doc = render_markdown(&state).unwrap();
        assert!(doc.starts_with("# Brewing Better Coffee"));
        assert!(doc.contains("**Topic**: coffee brewing"));
        assert!(doc.contains("## Intro"));
        assert!(doc.contains("collection done"));
        assert!(!doc.contains("### Errors"));
    }

    #[test]
    fn render_without_article_is_an_error() {
        let state = RunState::new("t", "a", "tone");
        assert!(render_markdown(&state).is_err());
    }

    #[test]
    fn save_writes_a_sanitized_filename() {
        let state = finished_state();
        let tmp = tempfile::tempdir().unwrap();
        let path = save(&state, tmp.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("blog_coffee_brewing_"));
        assert!(name.ends_with(".md"));
        assert!(path.exists());
    }

    #[test]
    fn slug_strips_punctuation_and_caps_length() {
        assert_eq!(safe_topic_slug("a/b: c?"), "ab_c");
        assert_eq!(safe_topic_slug(&"x".repeat(80)).len(), 50);
    }
}
