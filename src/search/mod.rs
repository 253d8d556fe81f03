//! Search gateway: provider abstraction over an answer-generation endpoint,
//! parallel topic-derived queries, and heuristic credibility scoring of the
//! returned sources.
//!
//! The endpoint is a black box: one prompt in, free text out. Per-query
//! failures inside `multi_search` are isolated and logged; partial results
//! are acceptable and expected.

pub mod credibility;
pub mod queries;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::warn;

use crate::config::CredibilityWeights;
use crate::content::{ContentType, SearchQuery, SourceInfo};
use crate::error::PipelineError;

pub use credibility::calculate_credibility;
pub use queries::create_search_queries;

/// One source stub as reported alongside an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStub {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Raw result of one `search` call.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub content: String,
    pub sources: Vec<SourceStub>,
    pub query: String,
}

/// Answer-endpoint abstraction used by both pipeline stages. Implemented by
/// the real HTTP client and by test mocks.
#[async_trait]
pub trait AnswerClient: Send + Sync {
    /// One search-flavored completion; fails with `Upstream` on transport or
    /// non-success status. No retry.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<SearchResponse, PipelineError>;

    /// One long-form generation call (higher token budget, longer timeout).
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynAnswerClient = Arc<dyn AnswerClient>;

// ------------------------------------------------------------
// Real client (Perplexity-style chat completions)
// ------------------------------------------------------------

const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
const SEARCH_MODEL: &str = "sonar";
const GENERATE_MODEL: &str = "sonar-pro";
const ENV_API_KEY: &str = "PERPLEXITY_API_KEY";

#[derive(Debug)]
pub struct SonarClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SonarClient {
    /// Build from an explicit key. An empty key is a configuration error.
    pub fn new(api_key: impl Into<String>) -> Result<Self, PipelineError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration(format!(
                "no API credential; set {ENV_API_KEY}"
            )));
        }
        let http = reqwest::Client::builder()
            .user_agent("blogsmith/0.1")
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Build from `PERPLEXITY_API_KEY`.
    pub fn from_env() -> Result<Self, PipelineError> {
        let key = std::env::var(ENV_API_KEY).unwrap_or_default();
        Self::new(key)
    }

    /// Point at a different endpoint (local proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn chat(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<String, PipelineError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            max_tokens: u32,
            temperature: f32,
            top_p: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
            top_p: 0.9,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(PipelineError::Upstream(format!(
                "endpoint returned HTTP {status}: {snippet}"
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| PipelineError::Upstream(format!("malformed endpoint reply: {e}")))?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl AnswerClient for SonarClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<SearchResponse, PipelineError> {
        let prompt = format!(
            "Provide detailed, accurate information about the following topic. \
             Use only trustworthy sources: {query}"
        );
        let content = self
            .chat(SEARCH_MODEL, &prompt, 2000, 0.2, Duration::from_secs(60))
            .await?;
        let sources = fabricate_stubs(query, &content, max_results);
        Ok(SearchResponse {
            content,
            sources,
            query: query.to_string(),
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        self.chat(GENERATE_MODEL, prompt, 4000, 0.3, Duration::from_secs(120))
            .await
    }

    fn provider_name(&self) -> &'static str {
        "sonar"
    }
}

/// The chat endpoint does not return citations on this tier, so stubs are
/// fabricated from the answer: up to min(max_results, 3), snippet = first
/// 200 chars. The first stub is the one that later carries the full answer.
fn fabricate_stubs(query: &str, content: &str, max_results: usize) -> Vec<SourceStub> {
    let snippet: String = content.chars().take(200).collect();
    (0..max_results.min(3))
        .map(|i| SourceStub {
            url: format!("https://example.com/source_{}", i + 1),
            title: format!("'{}' result {}", query, i + 1),
            snippet: snippet.clone(),
        })
        .collect()
}

// ------------------------------------------------------------
// Gateway: fan-out + classification + scoring
// ------------------------------------------------------------

pub struct SearchGateway {
    client: DynAnswerClient,
    weights: CredibilityWeights,
}

impl SearchGateway {
    pub fn new(client: DynAnswerClient, weights: CredibilityWeights) -> Self {
        Self { client, weights }
    }

    /// Dispatch all queries concurrently and fold results per content type.
    ///
    /// Never fails as a whole: a failed query is logged and contributes zero
    /// sources. Ordering within a type follows completion order of the
    /// underlying tasks, which is non-deterministic across runs.
    pub async fn multi_search(
        &self,
        queries: &[SearchQuery],
    ) -> HashMap<ContentType, Vec<SourceInfo>> {
        let mut results: HashMap<ContentType, Vec<SourceInfo>> = HashMap::new();
        for ct in [
            ContentType::BasicConcept,
            ContentType::LatestTrend,
            ContentType::PracticalCase,
            ContentType::ExpertOpinion,
        ] {
            results.insert(ct, Vec::new());
        }

        let mut set = JoinSet::new();
        for query in queries.iter().cloned() {
            let client = Arc::clone(&self.client);
            let weights = self.weights.clone();
            set.spawn(async move {
                let outcome = search_with_type(client.as_ref(), &weights, &query).await;
                (query, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((query, Ok(sources))) => {
                    results.entry(query.content_type).or_default().extend(sources);
                }
                Ok((query, Err(e))) => {
                    warn!(query = %query.query, error = %e, "search query failed; continuing without it");
                }
                Err(e) => {
                    warn!(error = %e, "search task aborted");
                }
            }
        }

        results
    }
}

/// Run one typed query and convert the stubs into scored `SourceInfo`
/// records. Only the first source of a query carries the full answer text.
async fn search_with_type(
    client: &dyn AnswerClient,
    weights: &CredibilityWeights,
    query: &SearchQuery,
) -> Result<Vec<SourceInfo>, PipelineError> {
    let response = client.search(&query.query, query.max_results).await?;

    let sources = response
        .sources
        .iter()
        .enumerate()
        .map(|(i, stub)| SourceInfo {
            url: stub.url.clone(),
            title: stub.title.clone(),
            summary: stub.snippet.clone(),
            content: if i == 0 {
                response.content.clone()
            } else {
                String::new()
            },
            credibility_score: credibility::calculate_credibility(stub, weights),
            content_type: query.content_type,
            published_date: None,
            author: None,
        })
        .collect();

    Ok(sources)
}
