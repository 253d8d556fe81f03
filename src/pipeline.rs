// src/pipeline.rs
//! Pipeline driver: a plain ordered two-stage sequence, not a graph
//! executor. Owns the `RunState`, hands each stage a read-only view, and
//! merges the returned deltas.
//!
//! Transitions: pending -> collecting -> writing -> reviewing -> completed,
//! with `failed` reachable from collecting or writing. After collection the
//! run proceeds only when at least one source was gathered; after writing it
//! terminates unconditionally (`reviewing` is a labeled placeholder, no
//! automated review runs).

use chrono::Utc;
use tracing::info;

use crate::config::ScoringConfig;
use crate::search::{DynAnswerClient, SearchGateway};
use crate::stages::{collect, write};
use crate::state::{RunState, RunStatus};

pub struct Pipeline {
    client: DynAnswerClient,
    gateway: SearchGateway,
    config: ScoringConfig,
}

impl Pipeline {
    /// Clients are injected explicitly; there are no process-wide singletons.
    pub fn new(client: DynAnswerClient, config: ScoringConfig) -> Self {
        let gateway = SearchGateway::new(client.clone(), config.credibility.clone());
        Self {
            client,
            gateway,
            config,
        }
    }

    /// Execute one topic-to-article run and return the final state.
    pub async fn run(&self, topic: &str, audience: &str, tone: &str) -> RunState {
        let mut state = RunState::new(topic, audience, tone);
        info!(topic, "pipeline run started");

        let update = collect::run(&state, &self.gateway, &self.config).await;
        state.merge(update);

        // Proceed to synthesis only with at least one collected source.
        if state.is_failed() || state.source_count() == 0 {
            info!(status = state.status.label(), "pipeline terminated after collection");
            return state;
        }

        let update = write::run(&state, self.client.as_ref(), &self.config).await;
        state.merge(update);

        if !state.is_failed() {
            state.completed_at = Some(Utc::now());
            state.set_status(RunStatus::Completed, "pipeline finished");
        }
        info!(status = state.status.label(), "pipeline run finished");
        state
    }
}
