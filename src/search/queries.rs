// src/search/queries.rs
// Fixed 3-query fan-out for a topic. This is the entire search strategy;
// it is deliberately not configurable per call.

use crate::content::{ContentType, SearchQuery};

const QUERY_LANGUAGE: &str = "en";

/// Produce exactly three queries for a topic: concept grounding (max 3),
/// current trends (max 4), expert opinion (max 3).
pub fn create_search_queries(topic: &str) -> Vec<SearchQuery> {
    vec![
        SearchQuery {
            query: format!("{topic} basic concept definition explained"),
            content_type: ContentType::BasicConcept,
            language: QUERY_LANGUAGE.to_string(),
            max_results: 3,
        },
        SearchQuery {
            query: format!("{topic} latest trends developments news"),
            content_type: ContentType::LatestTrend,
            language: QUERY_LANGUAGE.to_string(),
            max_results: 4,
        },
        SearchQuery {
            query: format!("{topic} expert analysis opinion review"),
            content_type: ContentType::ExpertOpinion,
            language: QUERY_LANGUAGE.to_string(),
            max_results: 3,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_three_queries_with_fixed_types_and_caps() {
        let queries = create_search_queries("coffee brewing");
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].content_type, ContentType::BasicConcept);
        assert_eq!(queries[0].max_results, 3);
        assert_eq!(queries[1].content_type, ContentType::LatestTrend);
        assert_eq!(queries[1].max_results, 4);
        assert_eq!(queries[2].content_type, ContentType::ExpertOpinion);
        assert_eq!(queries[2].max_results, 3);
        for q in &queries {
            assert!(q.query.starts_with("coffee brewing"));
            assert_eq!(q.language, "en");
        }
    }

    #[test]
    fn practical_case_slot_is_never_queried() {
        let queries = create_search_queries("anything");
        assert!(queries
            .iter()
            .all(|q| q.content_type != ContentType::PracticalCase));
    }
}
