// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod content;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod search;
pub mod stages;
pub mod state;
pub mod text;

// ---- Re-exports for a stable public API ----
pub use crate::config::{CredibilityWeights, QualityThresholds, ScoringConfig};
pub use crate::content::{
    BlogArticle, BlogSection, CollectedContent, ContentType, SearchQuery, SourceInfo,
};
pub use crate::error::PipelineError;
pub use crate::pipeline::Pipeline;
pub use crate::search::{
    AnswerClient, DynAnswerClient, SearchGateway, SearchResponse, SonarClient, SourceStub,
};
pub use crate::state::{RunState, RunStatus, RunSummary, StageUpdate};
