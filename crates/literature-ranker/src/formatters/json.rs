//! JSON output formatting.

use serde_json::{Value, json};

use crate::models::ScoredPaper;

/// Compact representation of a ranked paper. Absent fields are omitted.
#[must_use]
pub fn compact_scored(paper: &ScoredPaper) -> Value {
    let mut obj = json!({
        "title": paper.paper.title_or_default(),
        "source": paper.paper.source,
        "citations": paper.paper.citations,
        "isPrimary": paper.is_primary,
    });

    if let Some(position) = paper.position {
        obj["position"] = json!(position);
    }

    if let Some(relevance) = paper.relevance {
        obj["relevance"] = json!(relevance);
    }

    if let Some(tier) = paper.confidence_tier {
        obj["confidenceTier"] = json!(tier);
    }

    if let Some(rank) = paper.hierarchy_rank {
        obj["hierarchyRank"] = json!(rank);
    }

    if let Some(label) = &paper.tier_label {
        obj["tierLabel"] = json!(label);
    }

    if let Some(year) = paper.paper.year {
        obj["year"] = json!(year);
    }

    if !paper.paper.authors.is_empty() {
        obj["authors"] = json!(paper.paper.authors);
    }

    if let Some(venue) = &paper.paper.venue {
        obj["venue"] = json!(venue);
    }

    if !paper.paper.url.is_empty() {
        obj["url"] = json!(paper.paper.url);
    }

    obj
}

/// Ranked results for one query as a JSON document.
#[must_use]
pub fn format_ranked_json(query: &str, papers: &[ScoredPaper]) -> Value {
    json!({
        "query": query,
        "count": papers.len(),
        "papers": papers.iter().map(compact_scored).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidatePaper, ConfidenceTier};

    #[test]
    fn test_compact_scored() {
        let mut paper = ScoredPaper::unscored(CandidatePaper {
            source: "Semantic Scholar".to_string(),
            title: "Test Paper".to_string(),
            year: Some(2024),
            citations: 42,
            authors: vec!["John Doe".to_string()],
            ..Default::default()
        });
        paper.relevance = Some(0.65);
        paper.confidence_tier = Some(ConfidenceTier::High);
        paper.hierarchy_rank = Some(2);
        paper.position = Some(1);
        paper.is_primary = true;

        let compact = compact_scored(&paper);

        assert_eq!(compact["title"], "Test Paper");
        assert_eq!(compact["year"], 2024);
        assert_eq!(compact["citations"], 42);
        assert_eq!(compact["confidenceTier"], "high");
        assert_eq!(compact["hierarchyRank"], 2);
        assert_eq!(compact["isPrimary"], true);
        assert_eq!(compact["authors"], json!(["John Doe"]));
        assert!(compact.get("venue").is_none());
        assert!(compact.get("url").is_none());
    }

    #[test]
    fn test_unscored_has_no_ranking_fields() {
        let compact = compact_scored(&ScoredPaper::unscored(CandidatePaper::default()));
        assert!(compact.get("relevance").is_none());
        assert!(compact.get("position").is_none());
        assert_eq!(compact["isPrimary"], false);
    }

    #[test]
    fn test_format_ranked_json() {
        let doc = format_ranked_json("nets", &[]);
        assert_eq!(doc["query"], "nets");
        assert_eq!(doc["count"], 0);
        assert_eq!(doc["papers"], json!([]));
    }
}
