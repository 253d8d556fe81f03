// tests/multi_search.rs
// Failure isolation inside the concurrent fan-out: failed queries contribute
// zero sources and never abort the sibling queries.

use std::sync::Arc;

use async_trait::async_trait;
use blogsmith::search::{create_search_queries, SearchGateway};
use blogsmith::{
    AnswerClient, ContentType, CredibilityWeights, PipelineError, SearchResponse, SourceStub,
};

/// Fails every query whose text contains one of the poison markers.
struct FlakyClient {
    poison: Vec<&'static str>,
    stubs_per_query: usize,
}

#[async_trait]
impl AnswerClient for FlakyClient {
    async fn search(
        &self,
        query: &str,
        _max_results: usize,
    ) -> Result<SearchResponse, PipelineError> {
        if self.poison.iter().any(|p| query.contains(p)) {
            return Err(PipelineError::Upstream("simulated transport failure".into()));
        }
        let sources = (0..self.stubs_per_query)
            .map(|i| SourceStub {
                url: format!("https://example.com/{i}"),
                title: format!("result {i} for {query}"),
                snippet: "snippet".to_string(),
            })
            .collect();
        Ok(SearchResponse {
            content: "answer text".to_string(),
            sources,
            query: query.to_string(),
        })
    }

    async fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
        unreachable!("multi_search never generates");
    }

    fn provider_name(&self) -> &'static str {
        "flaky-mock"
    }
}

fn gateway(poison: Vec<&'static str>) -> SearchGateway {
    let client = Arc::new(FlakyClient {
        poison,
        stubs_per_query: 2,
    });
    SearchGateway::new(client, CredibilityWeights::default())
}

#[tokio::test]
async fn partial_failure_keeps_surviving_queries() {
    // Poison the trend query; concept and expert queries still land.
    let gw = gateway(vec!["latest trends"]);
    let queries = create_search_queries("coffee brewing");
    let results = gw.multi_search(&queries).await;

    assert_eq!(results[&ContentType::BasicConcept].len(), 2);
    assert_eq!(results[&ContentType::LatestTrend].len(), 0);
    assert_eq!(results[&ContentType::ExpertOpinion].len(), 2);
    assert_eq!(results[&ContentType::PracticalCase].len(), 0);
}

#[tokio::test]
async fn total_failure_returns_all_empty_mapping_without_raising() {
    let gw = gateway(vec!["coffee"]); // poisons all three queries
    let queries = create_search_queries("coffee brewing");
    let results = gw.multi_search(&queries).await;

    assert_eq!(results.len(), 4); // every content type has an (empty) slot
    assert!(results.values().all(|v| v.is_empty()));
}

#[tokio::test]
async fn sources_carry_type_and_scored_credibility() {
    let gw = gateway(vec![]);
    let queries = create_search_queries("coffee brewing");
    let results = gw.multi_search(&queries).await;

    let trends = &results[&ContentType::LatestTrend];
    assert_eq!(trends.len(), 2);
    for source in trends {
        assert_eq!(source.content_type, ContentType::LatestTrend);
        assert!((0.0..=1.0).contains(&source.credibility_score));
    }
    // Only the first source of a query carries the full answer text.
    assert_eq!(trends[0].content, "answer text");
    assert!(trends[1].content.is_empty());
}
