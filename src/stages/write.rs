// src/stages/write.rs
//! Article Synthesis Stage: builds a grounded generation prompt from the
//! collected content, invokes the answer endpoint once, parses the reply
//! (structured JSON or markdown) into a `BlogArticle`, scores it, and
//! backfills metadata from the collected sources.
//!
//! A malformed structured reply falls back to a single-section article and
//! never fails the stage; a transport failure does.

use tracing::{error, info, warn};

use crate::config::{QualityThresholds, ScoringConfig};
use crate::content::{BlogArticle, BlogSection, CollectedContent, ContentType, DEFAULT_CATEGORY};
use crate::error::PipelineError;
use crate::search::AnswerClient;
use crate::state::{RunState, RunStatus, StageUpdate};
use crate::text;

pub const STAGE_NAME: &str = "article_synthesis";

// Sufficiency warnings only; none of these fail the stage.
const MIN_SOURCES: usize = 3;
const MIN_POPULATED_TYPES: usize = 2;
const MIN_AVG_CREDIBILITY: f32 = 0.4;
const MIN_COLLECTED_CHARS: usize = 500;

/// How many characters of a raw reply survive into the fallback article.
const FALLBACK_BODY_CHARS: usize = 1000;

pub async fn run(
    state: &RunState,
    client: &dyn AnswerClient,
    config: &ScoringConfig,
) -> StageUpdate {
    info!(topic = %state.topic, "article synthesis started");

    let mut update = StageUpdate::default();

    let Some(collected) = state.collected_content.as_ref() else {
        let msg = PipelineError::ContentMissing.to_string();
        error!("{msg}");
        update.fail(&msg);
        return update;
    };

    update.status = Some(RunStatus::Writing);
    update.step("drafting article from collected content", 10);

    let issues = validate_content(collected);
    if !issues.is_empty() {
        warn!(?issues, "collected content sufficiency warnings");
        update.log(&format!("content warnings: {}", issues.join(", ")));
    }
    update.step("content sufficiency checked", 20);

    let summary = content_summary(collected);
    let prompt = build_prompt(
        &state.topic,
        &summary,
        &state.target_audience,
        &state.tone,
        &config.quality,
    );
    update.log("requesting article from the generation endpoint");
    update.step("generation in progress", 30);

    let raw = match client.generate(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(error = %e, "generation call failed");
            update.fail(&format!("article synthesis failed: {e}"));
            return update;
        }
    };

    let mut article = parse_article(&raw, &state.topic);
    article.recount(config.quality.words_per_minute);
    update.step("article drafted", 70);

    let report = quality_score(&article, &config.quality);
    update.log(&format!("article quality score: {:.2}/1.0", report.overall));
    if report.overall < config.quality.warn_quality_below {
        warn!(score = report.overall, "generated article scored below the quality bar");
        update.log("warning: generated article is below the quality bar");
    }
    update.step("quality scored", 85);

    enrich_metadata(&mut article, collected, config);
    update.step("metadata enriched", 95);

    update.stage_output = Some((
        STAGE_NAME.to_string(),
        serde_json::json!({
            "title": article.title,
            "word_count": article.word_count,
            "estimated_read_time": article.estimated_read_time,
            "sections": article.sections.len(),
            "image_placeholders": article.image_placeholders.len(),
            "meta_tags": article.meta_tags,
            "keywords": article.keywords,
            "category": article.category,
            "quality_score": report.overall,
            "creation_timestamp": article.creation_timestamp,
        }),
    ));

    update.log(&format!(
        "article '{}' drafted ({} words, {} sections)",
        article.title,
        article.word_count,
        article.sections.len()
    ));
    info!(
        words = article.word_count,
        sections = article.sections.len(),
        "article synthesis finished"
    );

    update.generated_article = Some(article);
    update.status = Some(RunStatus::Reviewing);
    update.step("awaiting review", 100);
    update
}

/// Human-readable grounding fed to the generation call: up to three
/// `title: summary` lines per non-empty content type.
fn content_summary(collected: &CollectedContent) -> String {
    let mut out = format!("Topic: {}\n\n", collected.topic);
    let blocks = [
        (ContentType::BasicConcept, "Core concepts"),
        (ContentType::LatestTrend, "Current trends"),
        (ContentType::PracticalCase, "Practical cases"),
        (ContentType::ExpertOpinion, "Expert opinions"),
    ];
    for (content_type, heading) in blocks {
        let sources = collected.sources_by_type(content_type);
        if sources.is_empty() {
            continue;
        }
        out.push_str(&format!("== {heading} ==\n"));
        for source in sources.iter().take(3) {
            out.push_str(&format!("- {}: {}\n", source.title, source.summary));
        }
        out.push('\n');
    }
    out
}

fn build_prompt(
    topic: &str,
    summary: &str,
    audience: &str,
    tone: &str,
    quality: &QualityThresholds,
) -> String {
    format!(
        "You are a professional blog writer. Write a complete blog article about '{topic}'.\n\n\
         Collected research:\n{summary}\n\
         Requirements:\n\
         1. A finished article of {min}-{max} words.\n\
         2. An engaging title and a clear structure: introduction -> core concepts -> current trends -> practical applications -> conclusion.\n\
         3. The target audience is {audience}; keep the tone {tone}.\n\
         4. Mark one image position per major section with a placeholder like [image: description].\n\
         5. Mention sources naturally in the text; no raw links.\n\n\
         Respond with a single JSON object:\n\
         {{\n\
           \"title\": \"...\",\n\
           \"subtitle\": \"...\",\n\
           \"sections\": [{{\"title\": \"...\", \"content\": \"markdown\", \"section_type\": \"intro|concept|trend|case|opinion|conclusion\", \"image_placeholder\": \"[image: ...]\"}}],\n\
           \"meta_tags\": [\"...\"],\n\
           \"keywords\": [\"...\"],\n\
           \"category\": \"...\"\n\
         }}",
        min = quality.target_length_min,
        max = quality.target_length_max,
    )
}

// ------------------------------------------------------------
// Response parsing
// ------------------------------------------------------------

#[derive(Debug, serde::Deserialize)]
struct ArticleDraft {
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    sections: Vec<SectionDraft>,
    #[serde(default)]
    meta_tags: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    category: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct SectionDraft {
    title: String,
    content: String,
    section_type: Option<String>,
    image_placeholder: Option<String>,
}

/// Parse a raw endpoint reply into an article. A reply that looks like JSON
/// (after stripping code fences) goes through the structured schema; a parse
/// failure there degrades to a single-section fallback. Anything else is
/// split on markdown headings.
pub fn parse_article(raw: &str, topic: &str) -> BlogArticle {
    let body = strip_code_fences(raw);
    if body.starts_with('{') {
        match serde_json::from_str::<ArticleDraft>(body) {
            Ok(draft) => return article_from_draft(draft, topic),
            Err(e) => {
                warn!(error = %e, "structured reply did not parse; using fallback article");
                return fallback_article(raw, topic);
            }
        }
    }
    article_from_markdown(body, topic)
}

fn fallback_title(topic: &str) -> String {
    format!("{topic}: a complete guide")
}

fn article_from_draft(draft: ArticleDraft, topic: &str) -> BlogArticle {
    let title = draft
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| fallback_title(topic));
    let mut article = BlogArticle::new(title);
    article.subtitle = draft.subtitle.filter(|s| !s.trim().is_empty());
    for section in draft.sections {
        article.add_section(BlogSection {
            title: section.title,
            content: section.content,
            section_type: section.section_type.unwrap_or_else(|| "general".to_string()),
            image_placeholder: section.image_placeholder,
        });
    }
    article.meta_tags = draft.meta_tags;
    article.keywords = draft.keywords;
    if let Some(category) = draft.category.filter(|c| !c.trim().is_empty()) {
        article.category = category;
    }
    if article.keywords.is_empty() {
        article.keywords.push(topic.to_string());
    }
    if article.meta_tags.is_empty() {
        article.meta_tags.push(topic.to_string());
    }
    article
}

/// Split free text on heading markers: the first `# ` line becomes the
/// title; each `## ` heading opens a section that accumulates lines until
/// the next heading. Preamble before the first section heading is dropped.
fn article_from_markdown(body: &str, topic: &str) -> BlogArticle {
    let mut title: Option<String> = None;
    let mut sections: Vec<BlogSection> = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in body.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("## ") {
            if let Some((section_title, text)) = current.take() {
                sections.push(plain_section(section_title, text));
            }
            current = Some((heading.trim().to_string(), String::new()));
        } else if let Some(heading) = trimmed.strip_prefix("# ") {
            if title.is_none() {
                title = Some(heading.trim().to_string());
            }
        } else if let Some((_, text)) = current.as_mut() {
            text.push_str(line);
            text.push('\n');
        }
    }
    if let Some((section_title, text)) = current.take() {
        sections.push(plain_section(section_title, text));
    }

    let mut article = BlogArticle::new(title.unwrap_or_else(|| fallback_title(topic)));
    if sections.is_empty() {
        // No headings at all; keep the reply as one block.
        article.add_section(BlogSection {
            title: "Overview".to_string(),
            content: body.trim().to_string(),
            section_type: "intro".to_string(),
            image_placeholder: None,
        });
    } else {
        for section in sections {
            article.add_section(section);
        }
    }
    article.keywords.push(topic.to_string());
    article.meta_tags.push(topic.to_string());
    article
}

fn plain_section(title: String, text: String) -> BlogSection {
    BlogSection {
        title,
        content: text.trim().to_string(),
        section_type: "general".to_string(),
        image_placeholder: None,
    }
}

/// Single-section article from the head of an unparseable structured reply.
fn fallback_article(raw: &str, topic: &str) -> BlogArticle {
    let head: String = raw.chars().take(FALLBACK_BODY_CHARS).collect();
    let mut article = BlogArticle::new(fallback_title(topic));
    article.add_section(BlogSection {
        title: "Overview".to_string(),
        content: head,
        section_type: "intro".to_string(),
        image_placeholder: None,
    });
    article.meta_tags.push(topic.to_string());
    article.keywords.push(topic.to_string());
    article
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the fence info line, then any trailing fence.
        let rest = rest.split_once('\n').map(|(_, r)| r).unwrap_or("");
        let rest = rest.trim_end();
        return rest.strip_suffix("```").unwrap_or(rest).trim();
    }
    trimmed
}

// ------------------------------------------------------------
// Quality scoring
// ------------------------------------------------------------

/// Per-factor breakdown; every field sits in [0,1].
#[derive(Debug, Clone, Copy)]
pub struct QualityReport {
    pub overall: f32,
    pub length: f32,
    pub structure: f32,
    pub metadata: f32,
    pub images: f32,
}

/// Unweighted mean of four bounded sub-scores. Heuristic, not calibrated.
pub fn quality_score(article: &BlogArticle, q: &QualityThresholds) -> QualityReport {
    let wc = article.word_count;
    let length = if (q.length_ideal_min..=q.length_ideal_max).contains(&wc) {
        1.0
    } else if (wc >= q.length_ok_min && wc < q.length_ideal_min)
        || (wc > q.length_ideal_max && wc <= q.length_ok_max)
    {
        0.7
    } else {
        0.3
    };

    let count = article.sections.len();
    let structure = if (q.sections_ideal_min..=q.sections_ideal_max).contains(&count) {
        1.0
    } else if (count >= q.sections_ok_min && count < q.sections_ideal_min)
        || (count > q.sections_ideal_max && count <= q.sections_ok_max)
    {
        0.7
    } else {
        0.3
    };

    let mut metadata = 0.0f32;
    if article.title.chars().count() > 5 {
        metadata += 0.3;
    }
    if article.meta_tags.len() >= 3 {
        metadata += 0.3;
    }
    if article.keywords.len() >= 3 {
        metadata += 0.2;
    }
    if !article.category.is_empty() {
        metadata += 0.2;
    }
    let metadata = metadata.min(1.0);

    let expected_images = (count / 2).max(1);
    let placeholders = article.image_placeholders.len();
    let images = if placeholders >= expected_images {
        1.0
    } else if placeholders > 0 {
        0.6
    } else {
        0.2
    };

    QualityReport {
        overall: (length + structure + metadata + images) / 4.0,
        length,
        structure,
        metadata,
        images,
    }
}

// ------------------------------------------------------------
// Metadata enrichment
// ------------------------------------------------------------

/// Backfill keywords, meta-tags, and category from the collected sources.
/// Keywords gain up to 3 new frequent terms; sparse tag sets are topped up
/// with the topic plus new terms to a cap of 8; the category is classified
/// only while it still carries the default placeholder.
pub fn enrich_metadata(
    article: &mut BlogArticle,
    collected: &CollectedContent,
    config: &ScoringConfig,
) {
    let texts: Vec<String> = collected
        .all_sources()
        .iter()
        .map(|s| format!("{} {}", s.title, s.summary))
        .collect();
    let common = text::frequent_terms(&texts, 2, 10);

    let new_terms: Vec<String> = common
        .iter()
        .take(5)
        .filter(|t| !article.keywords.contains(t))
        .cloned()
        .collect();
    article.keywords.extend(new_terms.iter().take(3).cloned());

    if article.meta_tags.len() < 5 {
        let mut candidates = vec![collected.topic.clone()];
        candidates.extend(new_terms.iter().cloned());
        for tag in candidates {
            if !article.meta_tags.contains(&tag) && article.meta_tags.len() < 8 {
                article.meta_tags.push(tag);
            }
        }
    }

    if article.category == DEFAULT_CATEGORY {
        let source_text = texts.join(" ");
        article.category = text::classify_category(
            &collected.topic,
            &source_text,
            &config.categories,
            DEFAULT_CATEGORY,
        );
    }
}

/// Pre-writing sufficiency check. Issues are warnings only.
fn validate_content(collected: &CollectedContent) -> Vec<String> {
    let mut issues = Vec::new();

    if collected.total_sources < MIN_SOURCES {
        issues.push(format!("only {} sources collected", collected.total_sources));
    }

    let populated = [
        !collected.basic_concepts.is_empty(),
        !collected.latest_trends.is_empty(),
        !collected.practical_cases.is_empty(),
        !collected.expert_opinions.is_empty(),
    ]
    .iter()
    .filter(|p| **p)
    .count();
    if populated < MIN_POPULATED_TYPES {
        issues.push("low content-type diversity".to_string());
    }

    let all = collected.all_sources();
    if !all.is_empty() {
        let avg: f32 =
            all.iter().map(|s| s.credibility_score).sum::<f32>() / all.len() as f32;
        if avg < MIN_AVG_CREDIBILITY {
            issues.push(format!("low average credibility: {avg:.2}"));
        }
    }

    let total_chars: usize = all
        .iter()
        .map(|s| s.summary.chars().count() + s.content.chars().count())
        .sum();
    if total_chars < MIN_COLLECTED_CHARS {
        issues.push("little collected text to ground the article".to_string());
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SourceInfo;

    fn source(content_type: ContentType, title: &str, summary: &str, cred: f32) -> SourceInfo {
        SourceInfo {
            url: "https://example.com".into(),
            title: title.into(),
            summary: summary.into(),
            content: String::new(),
            credibility_score: cred,
            content_type,
            published_date: None,
            author: None,
        }
    }

    #[test]
    fn markdown_reply_with_title_and_two_headings_yields_two_sections() {
        let raw = "# Coffee Brewing Mastery\n\nintro preamble\n\n## Getting Started\nGrind fresh.\n\n## Water Matters\nUse filtered water.\n";
        let article = parse_article(raw, "coffee brewing");
        assert_eq!(article.title, "Coffee Brewing Mastery");
        assert_eq!(article.sections.len(), 2);
        assert_eq!(article.sections[0].title, "Getting Started");
        assert_eq!(article.sections[1].title, "Water Matters");
        assert!(article.sections[1].content.contains("filtered water"));
    }

    #[test]
    fn missing_h1_uses_fallback_title() {
        let raw = "## Only Section\nbody\n";
        let article = parse_article(raw, "coffee brewing");
        assert_eq!(article.title, "coffee brewing: a complete guide");
        assert_eq!(article.sections.len(), 1);
    }

    #[test]
    fn headingless_reply_becomes_one_overview_section() {
        let article = parse_article("just plain prose, no structure", "tea");
        assert_eq!(article.sections.len(), 1);
        assert_eq!(article.sections[0].title, "Overview");
    }

    #[test]
    fn structured_json_reply_is_parsed_fully() {
        let raw = r#"```json
{
  "title": "T",
  "subtitle": "S",
  "sections": [
    {"title": "Intro", "content": "hello", "section_type": "intro", "image_placeholder": "[image: cup]"},
    {"title": "End", "content": "bye"}
  ],
  "meta_tags": ["a", "b"],
  "keywords": ["k"],
  "category": "lifestyle"
}
```"#;
        let article = parse_article(raw, "coffee");
        assert_eq!(article.title, "T");
        assert_eq!(article.subtitle.as_deref(), Some("S"));
        assert_eq!(article.sections.len(), 2);
        assert_eq!(article.sections[1].section_type, "general");
        assert_eq!(article.image_placeholders.len(), 1);
        assert_eq!(article.category, "lifestyle");
        assert!(article.content.contains("## Intro"));
    }

    #[test]
    fn broken_json_falls_back_to_first_thousand_chars() {
        let raw = format!("{{ not actually json {}", "a".repeat(2000));
        let article = parse_article(&raw, "coffee");
        assert_eq!(article.sections.len(), 1);
        assert_eq!(article.sections[0].content.chars().count(), 1000);
        assert_eq!(article.title, "coffee: a complete guide");
    }

    #[test]
    fn quality_score_is_mean_of_four_bounded_factors() {
        let mut article = BlogArticle::new("A fine long title");
        for i in 0..4 {
            article.add_section(BlogSection {
                title: format!("S{i}"),
                content: "word ".repeat(300),
                section_type: "general".into(),
                image_placeholder: if i == 0 { Some("[image: x]".into()) } else { None },
            });
        }
        article.meta_tags = vec!["a".into(), "b".into(), "c".into()];
        article.keywords = vec!["a".into(), "b".into(), "c".into()];
        article.recount(300);

        let q = QualityThresholds::default();
        let report = quality_score(&article, &q);
        for factor in [report.length, report.structure, report.metadata, report.images] {
            assert!((0.0..=1.0).contains(&factor));
        }
        let mean = (report.length + report.structure + report.metadata + report.images) / 4.0;
        assert!((report.overall - mean).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&report.overall));
        // 1200 words, 4 sections, full metadata: only images fall short.
        assert_eq!(report.length, 1.0);
        assert_eq!(report.structure, 1.0);
        assert_eq!(report.metadata, 1.0);
        assert_eq!(report.images, 0.6);
    }

    #[test]
    fn quality_score_degrades_on_thin_articles() {
        let mut article = BlogArticle::new("tiny");
        article.content = "short".into();
        article.recount(300);
        let report = quality_score(&article, &QualityThresholds::default());
        assert_eq!(report.length, 0.3);
        assert_eq!(report.structure, 0.3);
        assert_eq!(report.images, 0.2);
        assert!(report.overall < 0.5);
    }

    #[test]
    fn enrichment_adds_keywords_tags_and_category() {
        let mut collected = CollectedContent::new("AI programming");
        for i in 0..3 {
            collected.add_source(source(
                ContentType::BasicConcept,
                &format!("compiler toolchain notes {i}"),
                "compiler internals and toolchain design",
                0.7,
            ));
        }
        let mut article = BlogArticle::new("T");
        article.keywords = vec!["existing".into()];
        let config = ScoringConfig::default();
        enrich_metadata(&mut article, &collected, &config);

        assert!(article.keywords.len() > 1);
        assert!(article.keywords.len() <= 4); // at most 3 added
        assert!(article.meta_tags.contains(&"AI programming".to_string()));
        assert!(article.meta_tags.len() <= 8);
        assert_eq!(article.category, "technology");
    }

    #[test]
    fn enrichment_respects_existing_category() {
        let collected = CollectedContent::new("AI");
        let mut article = BlogArticle::new("T");
        article.category = "handpicked".to_string();
        enrich_metadata(&mut article, &collected, &ScoringConfig::default());
        assert_eq!(article.category, "handpicked");
    }

    #[test]
    fn sufficiency_check_flags_thin_content() {
        let mut collected = CollectedContent::new("t");
        collected.add_source(source(ContentType::BasicConcept, "a", "b", 0.2));
        let issues = validate_content(&collected);
        assert!(issues.iter().any(|i| i.contains("1 sources")));
        assert!(issues.iter().any(|i| i.contains("diversity")));
        assert!(issues.iter().any(|i| i.contains("credibility")));
    }
}
