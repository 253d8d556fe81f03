// src/error.rs
// Error taxonomy for the drafting pipeline.
//
// `Parse` is recovered locally by the synthesis stage (fallback article) and
// never reaches the driver; the other variants fail the stage that raised them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or unusable credential/config. Fatal at construction time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport failure or non-success HTTP status from the answer endpoint.
    /// Propagated to the calling stage untouched; there is no retry.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Article synthesis was attempted without prior collection.
    #[error("no collected content available; run information collection first")]
    ContentMissing,

    /// Malformed structured response from the endpoint.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::Upstream(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Parse(e.to_string())
    }
}
