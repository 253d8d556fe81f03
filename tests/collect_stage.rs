// tests/collect_stage.rs
// Information collection: success advances the run to `writing`; an empty
// harvest fails it.

use std::sync::Arc;

use async_trait::async_trait;
use blogsmith::search::SearchGateway;
use blogsmith::stages::collect;
use blogsmith::{
    AnswerClient, PipelineError, RunState, RunStatus, ScoringConfig, SearchResponse, SourceStub,
};

/// Returns a fixed number of stubs depending on the query flavor.
struct CannedClient {
    empty: bool,
}

#[async_trait]
impl AnswerClient for CannedClient {
    async fn search(
        &self,
        query: &str,
        _max_results: usize,
    ) -> Result<SearchResponse, PipelineError> {
        if self.empty {
            return Ok(SearchResponse {
                content: String::new(),
                sources: vec![],
                query: query.to_string(),
            });
        }
        // 2 concept, 2 trend, 1 expert = 5 sources overall.
        let count = if query.contains("expert") { 1 } else { 2 };
        let sources = (0..count)
            .map(|i| SourceStub {
                // wikipedia hits score 0.8, the rest 0.6; average 0.68-0.73
                url: if i == 0 {
                    "https://en.wikipedia.org/wiki/x".to_string()
                } else {
                    "https://plain.example/x".to_string()
                },
                title: format!("result {i}"),
                snippet: "informative snippet".to_string(),
            })
            .collect();
        Ok(SearchResponse {
            content: "full answer".to_string(),
            sources,
            query: query.to_string(),
        })
    }

    async fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
        unreachable!("collection never generates");
    }

    fn provider_name(&self) -> &'static str {
        "canned-mock"
    }
}

fn setup(empty: bool) -> (RunState, SearchGateway, ScoringConfig) {
    let config = ScoringConfig::default();
    let gateway = SearchGateway::new(
        Arc::new(CannedClient { empty }),
        config.credibility.clone(),
    );
    let state = RunState::new("coffee brewing", "hobbyists", "friendly");
    (state, gateway, config)
}

#[tokio::test]
async fn five_sources_advance_the_run_to_writing() {
    let (mut state, gateway, config) = setup(false);
    let update = collect::run(&state, &gateway, &config).await;
    state.merge(update);

    assert_eq!(state.status, RunStatus::Writing);
    assert_eq!(state.progress, 100);
    assert!(state.started_at.is_some());

    let collected = state.collected_content.as_ref().unwrap();
    assert_eq!(collected.total_sources, 5);
    assert_eq!(collected.basic_concepts.len(), 2);
    assert_eq!(collected.latest_trends.len(), 2);
    assert_eq!(collected.expert_opinions.len(), 1);
    assert!(collected.practical_cases.is_empty());

    let output = &state.stage_outputs[collect::STAGE_NAME];
    assert_eq!(output["total_sources"], 5);
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn zero_sources_fail_the_stage() {
    let (mut state, gateway, config) = setup(true);
    let update = collect::run(&state, &gateway, &config).await;
    state.merge(update);

    assert_eq!(state.status, RunStatus::Failed);
    assert!(state.collected_content.is_none());
    assert_eq!(state.errors.len(), 1);
    assert!(state.errors[0].contains("no information found"));
}
