// src/stages/collect.rs
//! Information Collection Stage: fixed query fan-out, concurrent dispatch,
//! aggregation into `CollectedContent`, and minimal sufficiency checks.
//!
//! Zero collected sources fails the stage; a shortage of high-credibility
//! sources is only a logged warning (soft threshold).

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::ScoringConfig;
use crate::content::{CollectedContent, ContentType};
use crate::search::{create_search_queries, SearchGateway};
use crate::state::{RunState, RunStatus, StageUpdate};

pub const STAGE_NAME: &str = "information_collection";

pub async fn run(
    state: &RunState,
    gateway: &SearchGateway,
    config: &ScoringConfig,
) -> StageUpdate {
    info!(topic = %state.topic, "information collection started");

    let mut update = StageUpdate::default();
    update.status = Some(RunStatus::Collecting);
    if state.started_at.is_none() {
        update.started_at = Some(Utc::now());
    }
    update.step("collecting topic information", 10);

    let queries = create_search_queries(&state.topic);
    update.log(&format!(
        "generated {} search queries for '{}'",
        queries.len(),
        state.topic
    ));
    update.step("dispatching search queries", 20);

    let mut results = gateway.multi_search(&queries).await;
    update.step("search results received", 60);

    let mut collected = CollectedContent::new(&state.topic);
    for content_type in [
        ContentType::BasicConcept,
        ContentType::LatestTrend,
        ContentType::PracticalCase,
        ContentType::ExpertOpinion,
    ] {
        let sources = results.remove(&content_type).unwrap_or_default();
        update.log(&format!(
            "{}: {} sources collected",
            content_type.label(),
            sources.len()
        ));
        for source in sources {
            collected.add_source(source);
        }
    }
    update.step("content aggregated", 80);

    if collected.total_sources == 0 {
        let msg = format!("no information found for topic '{}'", state.topic);
        error!(topic = %state.topic, "collection produced zero sources");
        update.fail(&msg);
        return update;
    }

    let high_quality = collected
        .all_sources()
        .iter()
        .filter(|s| s.credibility_score >= config.quality.high_credibility)
        .count();
    if high_quality < config.quality.min_high_quality_sources {
        warn!(high_quality, "few high-credibility sources for this topic");
        update.log(&format!(
            "warning: only {high_quality} high-credibility sources found"
        ));
    }

    update.stage_output = Some((
        STAGE_NAME.to_string(),
        serde_json::json!({
            "total_sources": collected.total_sources,
            "basic_concepts": collected.basic_concepts.len(),
            "latest_trends": collected.latest_trends.len(),
            "practical_cases": collected.practical_cases.len(),
            "expert_opinions": collected.expert_opinions.len(),
            "high_quality_sources": high_quality,
            "collection_timestamp": collected.collection_timestamp,
        }),
    ));

    update.log(&format!(
        "collected {} sources in total",
        collected.total_sources
    ));
    info!(total = collected.total_sources, "information collection finished");

    update.collected_content = Some(collected);
    update.status = Some(RunStatus::Writing);
    update.step("ready for article synthesis", 100);
    update
}
