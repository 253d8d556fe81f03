// src/config.rs
// Tunable scoring parameters. The credibility weights and quality bands are
// uncalibrated heuristics, so they live in config rather than as hard
// invariants. Loaded from TOML with env-var override and built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "BLOGSMITH_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/scoring.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub credibility: CredibilityWeights,
    pub quality: QualityThresholds,
    /// Ordered table; earlier entries win category ties.
    pub categories: Vec<CategoryRule>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            credibility: CredibilityWeights::default(),
            quality: QualityThresholds::default(),
            categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilityWeights {
    pub base: f32,
    pub trusted_domain_bonus: f32,
    pub title_bonus: f32,
    pub recency_bonus: f32,
    /// Title must exceed this many characters to earn the title bonus.
    pub min_title_len: usize,
    /// Substring allow-list checked in order; first match wins.
    pub trusted_domains: Vec<String>,
    /// Quality-signal substrings looked up in the (lowercased) title.
    pub quality_terms: Vec<String>,
}

impl Default for CredibilityWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            trusted_domain_bonus: 0.2,
            title_bonus: 0.1,
            recency_bonus: 0.1,
            min_title_len: 10,
            trusted_domains: [
                "wikipedia",
                "github",
                "stackoverflow",
                "medium",
                "arxiv",
                "nature.com",
                "acm.org",
                "ieee.org",
                "google",
                "microsoft",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            quality_terms: ["guide", "how to", "tutorial", "analysis", "review"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Ideal word-count band (score 1.0); the wider band scores 0.7.
    pub length_ideal_min: usize,
    pub length_ideal_max: usize,
    pub length_ok_min: usize,
    pub length_ok_max: usize,
    /// Ideal section-count band (score 1.0); the wider band scores 0.7.
    pub sections_ideal_min: usize,
    pub sections_ideal_max: usize,
    pub sections_ok_min: usize,
    pub sections_ok_max: usize,
    /// Word-unit band requested from the generation endpoint.
    pub target_length_min: usize,
    pub target_length_max: usize,
    pub words_per_minute: usize,
    /// Sources at or above this credibility count as high quality.
    pub high_credibility: f32,
    /// Fewer high-quality sources than this logs a warning (soft threshold).
    pub min_high_quality_sources: usize,
    /// Overall article scores below this log a warning, never a failure.
    pub warn_quality_below: f32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            length_ideal_min: 1000,
            length_ideal_max: 4000,
            length_ok_min: 500,
            length_ok_max: 6000,
            sections_ideal_min: 3,
            sections_ideal_max: 7,
            sections_ok_min: 2,
            sections_ok_max: 10,
            target_length_min: 2000,
            target_length_max: 3000,
            words_per_minute: 300,
            high_credibility: 0.6,
            min_high_quality_sources: 3,
            warn_quality_below: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

fn default_categories() -> Vec<CategoryRule> {
    let table: &[(&str, &[&str])] = &[
        (
            "technology",
            &[
                "ai",
                "artificial intelligence",
                "programming",
                "software",
                "development",
                "coding",
                "tech",
            ],
        ),
        (
            "business",
            &[
                "business",
                "management",
                "marketing",
                "startup",
                "investment",
                "economy",
                "finance",
            ],
        ),
        (
            "lifestyle",
            &[
                "health", "fitness", "cooking", "travel", "hobby", "fashion", "wellness",
            ],
        ),
        (
            "education",
            &["education", "learning", "study", "course", "teaching", "school"],
        ),
        (
            "entertainment",
            &["game", "movie", "music", "drama", "art", "culture"],
        ),
    ];
    table
        .iter()
        .map(|(name, keywords)| CategoryRule {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

impl ScoringConfig {
    /// Load from an explicit TOML path. Absent fields keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scoring config from {}", path.display()))?;
        let cfg: ScoringConfig = toml::from_str(&content)
            .with_context(|| format!("parsing scoring config {}", path.display()))?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $BLOGSMITH_CONFIG_PATH
    /// 2) config/scoring.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            anyhow::ensure!(
                pb.exists(),
                "{ENV_CONFIG_PATH} points to a non-existent path"
            );
            return Self::load_from(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::default())
    }
}
