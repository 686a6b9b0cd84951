//! Merging and relevance ranking of candidate papers.

mod scorer;

pub use scorer::{
    MAX_RECENCY_FACTOR, RelevanceScorer, ScoreBreakdown, assign_positions, citation_factor,
    recency_factor,
};

use crate::error::EmbeddingError;
use crate::models::{CandidatePaper, ScoredPaper};

/// Concatenate per-source results in source order. No dedup, no reordering.
#[must_use]
pub fn merge_results<I>(sources: I) -> Vec<CandidatePaper>
where
    I: IntoIterator<Item = Vec<CandidatePaper>>,
{
    sources.into_iter().flatten().collect()
}

/// Result of ranking one batch.
#[derive(Debug)]
pub enum RankOutcome {
    /// Every paper was scored, sorted and labelled.
    Ranked(Vec<ScoredPaper>),
    /// Scoring failed; the candidates come back in their original order.
    Unscored {
        /// The untouched input.
        papers: Vec<CandidatePaper>,
        /// Why scoring failed.
        error: EmbeddingError,
    },
}

impl RankOutcome {
    /// Whether scoring succeeded.
    #[must_use]
    pub const fn is_ranked(&self) -> bool {
        matches!(self, Self::Ranked(_))
    }

    /// Flatten into papers; unscored ones carry no ranking fields.
    #[must_use]
    pub fn into_papers(self) -> Vec<ScoredPaper> {
        match self {
            Self::Ranked(papers) => papers,
            Self::Unscored { papers, .. } => papers.into_iter().map(ScoredPaper::unscored).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str, source: &str) -> CandidatePaper {
        CandidatePaper { title: title.to_string(), source: source.to_string(), ..Default::default() }
    }

    #[test]
    fn test_merge_preserves_order_and_duplicates() {
        let merged = merge_results(vec![
            vec![titled("a", "S2"), titled("b", "S2")],
            vec![],
            vec![titled("a", "CrossRef")],
        ]);

        let titles: Vec<_> = merged.iter().map(|p| (p.title.as_str(), p.source.as_str())).collect();
        assert_eq!(titles, vec![("a", "S2"), ("b", "S2"), ("a", "CrossRef")]);
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        assert!(merge_results(Vec::<Vec<CandidatePaper>>::new()).is_empty());
    }
}
