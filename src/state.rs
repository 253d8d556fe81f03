// src/state.rs
// Mutable context carried through one topic-to-article run. The driver owns
// a `RunState`; each stage gets a read-only view and returns a `StageUpdate`
// delta that the driver merges back. No hidden aliasing between stages.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{BlogArticle, CollectedContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Collecting,
    Writing,
    /// Labeled placeholder; no automated review executes.
    Reviewing,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Collecting => "collecting",
            RunStatus::Writing => "writing",
            RunStatus::Reviewing => "reviewing",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub topic: String,
    pub target_audience: String,
    pub tone: String,

    pub collected_content: Option<CollectedContent>,
    pub generated_article: Option<BlogArticle>,

    pub status: RunStatus,
    pub current_step: String,
    /// 0-100; monotonically non-decreasing within a stage.
    pub progress: u8,

    pub logs: Vec<String>,
    pub errors: Vec<String>,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Stage name -> that stage's reported output record.
    pub stage_outputs: BTreeMap<String, serde_json::Value>,
}

impl RunState {
    pub fn new(topic: impl Into<String>, audience: impl Into<String>, tone: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            target_audience: audience.into(),
            tone: tone.into(),
            collected_content: None,
            generated_article: None,
            status: RunStatus::Pending,
            current_step: String::new(),
            progress: 0,
            logs: Vec::new(),
            errors: Vec::new(),
            started_at: None,
            completed_at: None,
            stage_outputs: BTreeMap::new(),
        }
    }

    pub fn add_log(&mut self, message: &str) {
        self.logs.push(stamp(message));
    }

    /// Append a timestamped error and downgrade the run to `failed`.
    pub fn add_error(&mut self, message: &str) {
        self.errors.push(stamp(message));
        self.status = RunStatus::Failed;
    }

    pub fn set_status(&mut self, status: RunStatus, step: &str) {
        self.status = status;
        if !step.is_empty() {
            self.current_step = step.to_string();
        }
        self.add_log(&format!("status changed to {}", status.label()));
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }

    pub fn source_count(&self) -> usize {
        self.collected_content
            .as_ref()
            .map(|c| c.total_sources)
            .unwrap_or(0)
    }

    /// Apply a stage's delta. Logs/errors append; optional fields replace
    /// only when the stage set them; a non-empty error list marks the run
    /// failed.
    pub fn merge(&mut self, update: StageUpdate) {
        self.logs.extend(update.logs);
        let failed = !update.errors.is_empty();
        self.errors.extend(update.errors);

        if let Some(cc) = update.collected_content {
            self.collected_content = Some(cc);
        }
        if let Some(article) = update.generated_article {
            self.generated_article = Some(article);
        }
        if self.started_at.is_none() {
            self.started_at = update.started_at;
        }
        if let Some(step) = update.current_step {
            self.current_step = step;
        }
        if let Some(p) = update.progress {
            self.progress = p.min(100);
        }
        if failed {
            self.status = RunStatus::Failed;
        } else if let Some(status) = update.status {
            self.status = status;
        }
        if let Some((name, value)) = update.stage_output {
            self.stage_outputs.insert(name, value);
        }
    }

    /// Read-only projection exposed to callers.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            topic: self.topic.clone(),
            status: self.status,
            current_step: self.current_step.clone(),
            progress: self.progress,
            sources_collected: self.source_count(),
            article_generated: self.generated_article.is_some(),
            word_count: self
                .generated_article
                .as_ref()
                .map(|a| a.word_count)
                .unwrap_or(0),
            error_count: self.errors.len(),
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

/// Partial-update record returned by a stage and merged by the driver.
#[derive(Debug, Default)]
pub struct StageUpdate {
    pub collected_content: Option<CollectedContent>,
    pub generated_article: Option<BlogArticle>,
    pub status: Option<RunStatus>,
    pub current_step: Option<String>,
    pub progress: Option<u8>,
    pub logs: Vec<String>,
    pub errors: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub stage_output: Option<(String, serde_json::Value)>,
}

impl StageUpdate {
    pub fn log(&mut self, message: &str) {
        self.logs.push(stamp(message));
    }

    /// Record a failure: timestamped error entry plus terminal status.
    pub fn fail(&mut self, message: &str) {
        self.errors.push(stamp(message));
        self.status = Some(RunStatus::Failed);
    }

    pub fn step(&mut self, step: &str, progress: u8) {
        self.current_step = Some(step.to_string());
        self.progress = Some(progress.min(100));
        self.log(&format!("{step} ({progress}%)"));
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub topic: String,
    pub status: RunStatus,
    pub current_step: String,
    pub progress: u8,
    pub sources_collected: usize,
    pub article_generated: bool,
    pub word_count: usize,
    pub error_count: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn stamp(message: &str) -> String {
    format!("[{}] {}", Utc::now().format("%Y-%m-%d %H:%M:%S"), message)
}
