// src/text.rs
// Text helpers shared by the synthesis stage: word counting, frequent-term
// extraction, and category classification.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::CategoryRule;

/// Counting rule, applied uniformly everywhere a word count is needed:
/// each CJK character (Hangul, Han, Kana) counts as one word unit; each
/// ASCII alphanumeric run counts as one. Scripts without whitespace-delimited
/// words are counted per character, whitespace-delimited scripts per token.
pub fn word_count(text: &str) -> usize {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"[\p{Hangul}\p{Han}\p{Hiragana}\p{Katakana}]|[A-Za-z0-9]+").unwrap()
    });
    re.find_iter(text).count()
}

/// Estimated reading time in minutes: max(1, words / words_per_minute).
pub fn read_time_minutes(word_count: usize, words_per_minute: usize) -> usize {
    (word_count / words_per_minute.max(1)).max(1)
}

const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "have", "will", "your", "their", "about", "more", "also",
    "into", "than", "when", "what", "which", "there", "been", "were", "they", "them", "some",
    "such", "only", "over", "most", "each", "other", "these", "those", "while", "where",
];

/// Extract frequently recurring terms from the given texts: Latin words of
/// four or more characters (lowercased, minus stopwords) and CJK runs of two
/// or more characters. Terms occurring at least `min_occurrences` times are
/// ranked by frequency (ties by first appearance) and the top `limit` kept.
pub fn frequent_terms(texts: &[String], min_occurrences: usize, limit: usize) -> Vec<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE
        .get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z0-9]{3,}|[\p{Hangul}\p{Han}]{2,}").unwrap());

    let mut counts: Vec<(String, usize, usize)> = Vec::new(); // (term, count, first_seen)
    let mut seen = 0usize;
    for text in texts {
        for m in re.find_iter(text) {
            let term = m.as_str().to_lowercase();
            if STOPWORDS.contains(&term.as_str()) {
                continue;
            }
            match counts.iter_mut().find(|(t, _, _)| *t == term) {
                Some((_, c, _)) => *c += 1,
                None => {
                    counts.push((term, 1, seen));
                    seen += 1;
                }
            }
        }
    }

    counts.retain(|(_, c, _)| *c >= min_occurrences);
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    counts.into_iter().take(limit).map(|(t, _, _)| t).collect()
}

/// Score the topic and concatenated source text against an ordered
/// keyword-to-category table. A keyword hit in the topic is worth 3 points,
/// a hit in the source text 1. Ties break by table order; an all-zero score
/// falls back to `fallback`.
pub fn classify_category(
    topic: &str,
    source_text: &str,
    rules: &[CategoryRule],
    fallback: &str,
) -> String {
    let topic_lower = topic.to_lowercase();
    let source_lower = source_text.to_lowercase();

    let mut best: Option<(&str, u32)> = None;
    for rule in rules {
        let mut score = 0u32;
        for keyword in &rule.keywords {
            let kw = keyword.to_lowercase();
            if topic_lower.contains(&kw) {
                score += 3;
            }
            if source_lower.contains(&kw) {
                score += 1;
            }
        }
        match best {
            Some((_, s)) if score <= s => {}
            _ if score > 0 => best = Some((rule.name.as_str(), score)),
            _ => {}
        }
    }

    best.map(|(name, _)| name.to_string())
        .unwrap_or_else(|| fallback.to_string())
}
