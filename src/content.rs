// src/content.rs
// Content model: passive records for sources, the per-topic aggregate,
// and the synthesized article.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text;

/// Category label an article carries until auto-classification runs.
pub const DEFAULT_CATEGORY: &str = "general";

/// Classification of one retrieved source.
///
/// `PracticalCase` is a fourth slot referenced by summaries and sufficiency
/// checks but never populated by the fixed query generator; it stays empty
/// in the current design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    BasicConcept,
    LatestTrend,
    PracticalCase,
    ExpertOpinion,
}

impl ContentType {
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::BasicConcept => "basic_concept",
            ContentType::LatestTrend => "latest_trend",
            ContentType::PracticalCase => "practical_case",
            ContentType::ExpertOpinion => "expert_opinion",
        }
    }
}

/// One retrieved unit of information. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub url: String,
    pub title: String,
    pub summary: String,
    /// Full answer text; only the first source of a query carries it.
    #[serde(default)]
    pub content: String,
    /// Heuristic trust estimate in [0,1].
    pub credibility_score: f32,
    pub content_type: ContentType,
    pub published_date: Option<String>,
    pub author: Option<String>,
}

/// Aggregate of everything collected for one topic.
///
/// Invariant: `total_sources` always equals the sum of the slot lengths;
/// recomputed on every insertion. Mutated only through `add_source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedContent {
    pub topic: String,
    pub basic_concepts: Vec<SourceInfo>,
    pub latest_trends: Vec<SourceInfo>,
    pub practical_cases: Vec<SourceInfo>,
    pub expert_opinions: Vec<SourceInfo>,
    pub collection_timestamp: DateTime<Utc>,
    pub total_sources: usize,
}

impl CollectedContent {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            basic_concepts: Vec::new(),
            latest_trends: Vec::new(),
            practical_cases: Vec::new(),
            expert_opinions: Vec::new(),
            collection_timestamp: Utc::now(),
            total_sources: 0,
        }
    }

    /// Append a source to the slot matching its content type and recompute
    /// the total.
    pub fn add_source(&mut self, source: SourceInfo) {
        match source.content_type {
            ContentType::BasicConcept => self.basic_concepts.push(source),
            ContentType::LatestTrend => self.latest_trends.push(source),
            ContentType::PracticalCase => self.practical_cases.push(source),
            ContentType::ExpertOpinion => self.expert_opinions.push(source),
        }
        self.total_sources = self.basic_concepts.len()
            + self.latest_trends.len()
            + self.practical_cases.len()
            + self.expert_opinions.len();
    }

    /// Sources for one type; empty slice (not an error) when none exist.
    pub fn sources_by_type(&self, content_type: ContentType) -> &[SourceInfo] {
        match content_type {
            ContentType::BasicConcept => &self.basic_concepts,
            ContentType::LatestTrend => &self.latest_trends,
            ContentType::PracticalCase => &self.practical_cases,
            ContentType::ExpertOpinion => &self.expert_opinions,
        }
    }

    /// All sources in fixed type order: basic_concept, latest_trend,
    /// expert_opinion, then the (empty) practical_case slot.
    pub fn all_sources(&self) -> Vec<&SourceInfo> {
        self.basic_concepts
            .iter()
            .chain(self.latest_trends.iter())
            .chain(self.expert_opinions.iter())
            .chain(self.practical_cases.iter())
            .collect()
    }
}

/// One titled block of article content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSection {
    pub title: String,
    pub content: String,
    /// Free-form label: intro, concept, trend, case, opinion, conclusion, ...
    pub section_type: String,
    pub image_placeholder: Option<String>,
}

/// The synthesized article. Mutated by the synthesis stage and the metadata
/// enrichment step; never after the pipeline reports completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogArticle {
    pub title: String,
    pub subtitle: Option<String>,
    /// Full body text (concatenation of section bodies, markdown).
    pub content: String,
    pub sections: Vec<BlogSection>,
    pub meta_tags: Vec<String>,
    pub keywords: Vec<String>,
    pub category: String,
    /// Minutes; pure function of `word_count`.
    pub estimated_read_time: usize,
    pub image_placeholders: Vec<String>,
    pub creation_timestamp: DateTime<Utc>,
    /// Pure function of `content`; recomputed via `recount`.
    pub word_count: usize,
}

impl BlogArticle {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            content: String::new(),
            sections: Vec::new(),
            meta_tags: Vec::new(),
            keywords: Vec::new(),
            category: DEFAULT_CATEGORY.to_string(),
            estimated_read_time: 1,
            image_placeholders: Vec::new(),
            creation_timestamp: Utc::now(),
            word_count: 0,
        }
    }

    /// Append a section, extending the full body and collecting its image
    /// placeholder when present.
    pub fn add_section(&mut self, section: BlogSection) {
        if let Some(marker) = &section.image_placeholder {
            self.image_placeholders.push(marker.clone());
        }
        self.content
            .push_str(&format!("\n\n## {}\n\n{}", section.title, section.content));
        self.sections.push(section);
    }

    /// Recompute word count and read time from the current body text.
    /// Must be called whenever `content` changes.
    pub fn recount(&mut self, words_per_minute: usize) {
        self.word_count = text::word_count(&self.content);
        self.estimated_read_time = text::read_time_minutes(self.word_count, words_per_minute);
    }
}

/// One dispatchable search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub content_type: ContentType,
    pub language: String,
    pub max_results: usize,
}
