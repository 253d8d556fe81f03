// src/search/credibility.rs
// Heuristic credibility scoring for returned source stubs. Pure and
// reproducible: downstream sufficiency checks threshold on the result.

use crate::config::CredibilityWeights;
use crate::search::SourceStub;

/// Score a source stub into [0,1]: base score, plus a bonus for the first
/// matching trusted-domain substring (checked in list order), plus a title
/// bonus when the title is long enough and carries a quality-signal term,
/// plus a flat recency bonus. Clamped to [0,1].
pub fn calculate_credibility(stub: &SourceStub, weights: &CredibilityWeights) -> f32 {
    let mut score = weights.base;

    let url = stub.url.to_lowercase();
    let title = stub.title.to_lowercase();

    for domain in &weights.trusted_domains {
        if url.contains(&domain.to_lowercase()) {
            score += weights.trusted_domain_bonus;
            break;
        }
    }

    if title.chars().count() > weights.min_title_len
        && weights
            .quality_terms
            .iter()
            .any(|term| title.contains(&term.to_lowercase()))
    {
        score += weights.title_bonus;
    }

    // Flat recency bonus; the answer endpoint only surfaces current material.
    score += weights.recency_bonus;

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(url: &str, title: &str) -> SourceStub {
        SourceStub {
            url: url.to_string(),
            title: title.to_string(),
            snippet: String::new(),
        }
    }

    #[test]
    fn scoring_is_pure_and_clamped() {
        let w = CredibilityWeights::default();
        let s = stub(
            "https://en.wikipedia.org/wiki/Coffee",
            "A complete guide to coffee brewing",
        );
        let a = calculate_credibility(&s, &w);
        let b = calculate_credibility(&s, &w);
        assert_eq!(a, b);
        assert!((0.0..=1.0).contains(&a));
        // base 0.5 + domain 0.2 + title 0.1 + recency 0.1
        assert!((a - 0.9).abs() < 1e-6);
    }

    #[test]
    fn untrusted_short_title_gets_base_plus_recency() {
        let w = CredibilityWeights::default();
        let s = stub("https://nobody.example/post", "short");
        let score = calculate_credibility(&s, &w);
        assert!((score - (w.base + w.recency_bonus)).abs() < 1e-6);
    }

    #[test]
    fn first_domain_match_wins_only_once() {
        let w = CredibilityWeights::default();
        // URL matching two allow-list entries still earns a single bonus.
        let s = stub("https://github.com/wikipedia-mirror", "x");
        let score = calculate_credibility(&s, &w);
        assert!((score - (w.base + w.trusted_domain_bonus + w.recency_bonus)).abs() < 1e-6);
    }

    #[test]
    fn title_bonus_requires_length_and_signal_term() {
        let w = CredibilityWeights::default();
        // Long enough but no signal term.
        let s1 = stub("https://nobody.example", "a very long but plain headline");
        // Signal term but too short.
        let s2 = stub("https://nobody.example", "guide");
        let plain = w.base + w.recency_bonus;
        assert!((calculate_credibility(&s1, &w) - plain).abs() < 1e-6);
        assert!((calculate_credibility(&s2, &w) - plain).abs() < 1e-6);
    }

    #[test]
    fn never_exceeds_one() {
        let mut w = CredibilityWeights::default();
        w.base = 0.9;
        let s = stub("https://github.com", "the definitive guide to everything");
        assert_eq!(calculate_credibility(&s, &w), 1.0);
    }
}
