//! Composite relevance scoring and hierarchy assignment.
//!
//! relevance = semantic similarity x recency factor x citation factor

use std::sync::Arc;

use chrono::Datelike;

use super::RankOutcome;
use crate::embedding::{SharedEmbedder, cosine_similarity};
use crate::error::{EmbeddingError, EmbeddingResult};
use crate::models::{CandidatePaper, ConfidenceTier, ScoredPaper, tier_label};

/// Upper bound of the recency bonus.
pub const MAX_RECENCY_FACTOR: f64 = 2.0;

/// Recency multiplier: `min(2, 1 + 5 / max(1, current_year - year))`, or 1 when the year is unknown.
#[must_use]
pub fn recency_factor(year: Option<i32>, current_year: i32) -> f64 {
    match year {
        Some(year) => {
            let years_old = current_year.saturating_sub(year).max(1);
            (1.0 + 5.0 / f64::from(years_old)).min(MAX_RECENCY_FACTOR)
        }
        None => 1.0,
    }
}

/// Citation multiplier: `1 + 0.1 * citations^0.3`, or 1 for uncited papers.
#[must_use]
pub fn citation_factor(citations: u32) -> f64 {
    if citations > 0 { 1.0 + 0.1 * f64::from(citations).powf(0.3) } else { 1.0 }
}

/// The parts that make up one paper's relevance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// Cosine similarity between query and paper text, floored at 0.
    pub semantic_similarity: f64,
    /// See [`recency_factor`].
    pub recency_factor: f64,
    /// See [`citation_factor`].
    pub citation_factor: f64,
    /// Product of the three.
    pub relevance: f64,
}

impl ScoreBreakdown {
    /// Combine a raw similarity with the paper's year and citations.
    ///
    /// Negative similarities are floored at 0 so relevance is never negative.
    #[must_use]
    pub fn compute(similarity: f64, paper: &CandidatePaper, current_year: i32) -> Self {
        let semantic_similarity = if similarity.is_nan() { 0.0 } else { similarity.max(0.0) };
        let recency_factor = recency_factor(paper.year, current_year);
        let citation_factor = citation_factor(paper.citations);

        Self {
            semantic_similarity,
            recency_factor,
            citation_factor,
            relevance: semantic_similarity * recency_factor * citation_factor,
        }
    }
}

/// Scores, sorts and labels candidate papers for one query.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    embedder: Arc<SharedEmbedder>,
    reference_year: Option<i32>,
}

impl RelevanceScorer {
    /// Create a scorer that measures recency against the current calendar year.
    #[must_use]
    pub fn new(embedder: Arc<SharedEmbedder>) -> Self {
        Self { embedder, reference_year: None }
    }

    /// Pin the year recency is measured against.
    #[must_use]
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Year used for recency.
    #[must_use]
    pub fn current_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| chrono::Utc::now().year())
    }

    /// Load the embedding model now instead of on the first non-empty batch.
    ///
    /// # Errors
    ///
    /// Returns the load failure; a later call retries it.
    pub async fn load_model(&self) -> EmbeddingResult<()> {
        self.embedder.get().await.map(|_| ())
    }

    /// Score and rank the whole batch.
    ///
    /// Any failure hands the candidates back untouched as [`RankOutcome::Unscored`].
    pub async fn rank(&self, query: &str, papers: Vec<CandidatePaper>) -> RankOutcome {
        match self.try_rank(query, &papers).await {
            Ok(ranked) => {
                log_hierarchy(&ranked);
                RankOutcome::Ranked(ranked)
            }
            Err(error) => {
                tracing::warn!(%error, count = papers.len(), "ranking failed, returning unscored papers");
                RankOutcome::Unscored { papers, error }
            }
        }
    }

    async fn try_rank(
        &self,
        query: &str,
        papers: &[CandidatePaper],
    ) -> EmbeddingResult<Vec<ScoredPaper>> {
        if papers.is_empty() {
            return Ok(Vec::new());
        }

        let embedder = self.embedder.get().await?;
        let current_year = self.current_year();
        let query_embedding = embedder.embed(query).await?;

        let texts: Vec<String> =
            papers.iter().filter(|p| p.has_text()).map(CandidatePaper::comparison_text).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embeddings = embedder.embed_batch(&text_refs).await?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::inference(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        let mut embeddings = embeddings.into_iter();

        let mut scored = Vec::with_capacity(papers.len());
        for paper in papers {
            let mut entry = ScoredPaper::unscored(paper.clone());

            if paper.has_text() {
                let embedding = embeddings
                    .next()
                    .ok_or_else(|| EmbeddingError::inference("ran out of embeddings"))?;
                let similarity = cosine_similarity(&query_embedding, &embedding)?;
                let breakdown = ScoreBreakdown::compute(similarity, paper, current_year);

                if !breakdown.relevance.is_finite() {
                    return Err(EmbeddingError::inference(format!(
                        "non-finite relevance for '{}'",
                        paper.title_or_default()
                    )));
                }

                let tier = ConfidenceTier::from_relevance(breakdown.relevance);
                entry.relevance = Some(breakdown.relevance);
                entry.confidence_tier = Some(tier);
                entry.hierarchy_rank = Some(tier.hierarchy_rank());
            } else {
                entry.relevance = Some(0.0);
                entry.confidence_tier = Some(ConfidenceTier::Low);
            }

            scored.push(entry);
        }

        assign_positions(&mut scored);
        Ok(scored)
    }
}

/// Stable sort by descending relevance, then number positions and label roles.
///
/// Ties keep their incoming order. Missing relevance counts as 0.
pub fn assign_positions(papers: &mut [ScoredPaper]) {
    papers.sort_by(|a, b| b.relevance_or_zero().total_cmp(&a.relevance_or_zero()));

    for (index, paper) in papers.iter_mut().enumerate() {
        let position = index + 1;
        paper.position = Some(position);
        paper.is_primary = position == 1;
        paper.tier_label = Some(tier_label(position));
    }
}

fn log_hierarchy(papers: &[ScoredPaper]) {
    let Some(primary) = papers.first() else {
        return;
    };

    tracing::info!(
        title = %primary.paper.title_or_default().chars().take(50).collect::<String>(),
        score = %format!("{:.3}", primary.relevance_or_zero()),
        "primary reference selected"
    );

    if let Some(last) = papers.last().filter(|_| papers.len() > 1) {
        tracing::info!(
            count = papers.len() - 1,
            top = %format!("{:.3}", papers[1].relevance_or_zero()),
            bottom = %format!("{:.3}", last.relevance_or_zero()),
            "secondary references ranked"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingProvider, HashingEmbedder};

    fn scorer() -> RelevanceScorer {
        let embedder = SharedEmbedder::from_provider(Arc::new(HashingEmbedder::default()));
        RelevanceScorer::new(Arc::new(embedder)).with_reference_year(2025)
    }

    fn paper(title: &str, abstract_text: &str, year: Option<i32>, citations: u32) -> CandidatePaper {
        CandidatePaper {
            source: "test".to_string(),
            title: title.to_string(),
            r#abstract: abstract_text.to_string(),
            year,
            citations,
            ..Default::default()
        }
    }

    #[test]
    fn test_recency_factor_values() {
        assert!((recency_factor(None, 2025) - 1.0).abs() < 1e-12);
        assert!((recency_factor(Some(2025), 2025) - 2.0).abs() < 1e-12);
        assert!((recency_factor(Some(2030), 2025) - 2.0).abs() < 1e-12);
        assert!((recency_factor(Some(2015), 2025) - 1.5).abs() < 1e-12);
        assert!((recency_factor(Some(1970), 2025) - (1.0 + 5.0 / 55.0)).abs() < 1e-12);
        assert!((recency_factor(Some(i32::MIN), 2025) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_citation_factor_values() {
        assert!((citation_factor(0) - 1.0).abs() < 1e-12);
        assert!((citation_factor(1) - 1.1).abs() < 1e-12);
        assert!((citation_factor(50) - (1.0 + 0.1 * 50f64.powf(0.3))).abs() < 1e-12);
        assert!(citation_factor(10_000) > citation_factor(9_999));
    }

    #[test]
    fn test_breakdown_floors_negative_similarity() {
        let p = paper("x", "", Some(2024), 3);
        let breakdown = ScoreBreakdown::compute(-0.4, &p, 2025);
        assert!((breakdown.relevance - 0.0).abs() < 1e-12);
        assert!((ScoreBreakdown::compute(f64::NAN, &p, 2025).relevance - 0.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_empty_text_paper_is_low_with_zero_relevance() {
        let ranked = scorer()
            .rank("malaria", vec![paper("", "  ", Some(2024), 100), paper("Malaria", "", None, 0)])
            .await
            .into_papers();

        let empty = ranked.iter().find(|p| p.paper.title.is_empty()).unwrap();
        assert_eq!(empty.relevance, Some(0.0));
        assert_eq!(empty.confidence_tier, Some(ConfidenceTier::Low));
        assert_eq!(empty.hierarchy_rank, None);
        assert_eq!(empty.position, Some(2));
    }

    #[tokio::test]
    async fn test_identical_text_old_uncited_paper() {
        let query = "malaria prevention rural healthcare";
        let ranked =
            scorer().rank(query, vec![paper(query, "", Some(1970), 0)]).await.into_papers();

        let relevance = ranked[0].relevance.unwrap();
        assert!((relevance - (1.0 + 5.0 / 55.0)).abs() < 1e-4, "relevance was {relevance}");
        assert_eq!(ranked[0].confidence_tier, Some(ConfidenceTier::Highest));
        assert!(ranked[0].is_primary);
    }

    #[tokio::test]
    async fn test_ties_keep_merge_order() {
        let ranked = scorer()
            .rank(
                "bed nets",
                vec![
                    paper("bed nets", "", None, 0),
                    paper("", "", None, 0),
                    paper("bed nets", "", None, 0),
                ],
            )
            .await
            .into_papers();

        let sources: Vec<_> = ranked.iter().map(|p| (p.paper.title.as_str(), p.position)).collect();
        assert_eq!(sources, vec![("bed nets", Some(1)), ("bed nets", Some(2)), ("", Some(3))]);
        assert_eq!(ranked[1].tier_label.as_deref(), Some("Secondary Reference #1 (High Confidence)"));
    }

    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
            Err(EmbeddingError::inference("backend crashed"))
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_backend_failure_returns_unscored_in_merge_order() {
        let embedder = SharedEmbedder::from_provider(Arc::new(FailingEmbedder));
        let scorer = RelevanceScorer::new(Arc::new(embedder));
        let input = vec![paper("b", "", None, 0), paper("a", "", None, 9)];

        let outcome = scorer.rank("query", input.clone()).await;
        assert!(!outcome.is_ranked());

        let papers = outcome.into_papers();
        assert_eq!(papers.iter().map(|p| p.paper.clone()).collect::<Vec<_>>(), input);
        assert!(papers.iter().all(|p| p.relevance.is_none() && p.position.is_none()));
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_load_model() {
        let embedder = Arc::new(SharedEmbedder::with_loader(|| {
            Err(EmbeddingError::load("must not be called"))
        }));
        let outcome = RelevanceScorer::new(Arc::clone(&embedder)).rank("q", vec![]).await;

        assert!(outcome.is_ranked());
        assert!(outcome.into_papers().is_empty());
        assert!(!embedder.is_initialized());
    }
}
