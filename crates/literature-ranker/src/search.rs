//! Literature search orchestration: fetch, merge, rank, truncate.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use crate::client::ScholarlyClient;
use crate::config::Config;
use crate::embedding::SharedEmbedder;
use crate::error::{SearchError, SearchResult};
use crate::models::{CandidatePaper, ScoredPaper};
use crate::ranking::{RankOutcome, RelevanceScorer, merge_results};
use crate::sources::{PaperSource, default_sources};

/// Public entry point for "find literature relevant to X".
#[derive(Clone)]
pub struct LiteratureSearch {
    sources: Vec<Arc<dyn PaperSource>>,
    scorer: RelevanceScorer,
    max_limit: usize,
}

impl LiteratureSearch {
    /// Build the standard engine (Semantic Scholar + CrossRef) from configuration.
    ///
    /// The embedding model is the process-wide [`SharedEmbedder::global`] and is
    /// not loaded until the first search that has something to rank.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = ScholarlyClient::new(config)?;
        let embedder =
            SharedEmbedder::global(config.embedding_backend, config.model_cache_dir.clone());

        Ok(Self::new(default_sources(&client, config), embedder)
            .with_max_limit(config.max_search_limit))
    }

    /// Build an engine from explicit sources and an explicit model handle.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn PaperSource>>, embedder: Arc<SharedEmbedder>) -> Self {
        Self {
            sources,
            scorer: RelevanceScorer::new(embedder),
            max_limit: crate::config::limits::MAX_SEARCH_LIMIT,
        }
    }

    /// Largest limit accepted; larger requests are clamped to it.
    #[must_use]
    pub fn with_max_limit(mut self, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    /// Names of the configured sources, in merge order.
    #[must_use]
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Find up to `limit` papers for `query`, best first.
    ///
    /// Every source is asked for `limit` rows; the full merged set is ranked
    /// before truncation. Zero results is a valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty query or a zero limit.
    pub async fn search(&self, query: &str, limit: usize) -> SearchResult<Vec<ScoredPaper>> {
        let limit = self.validate(query, limit)?;
        let started = Instant::now();
        tracing::info!(
            query = %query.chars().take(50).collect::<String>(),
            limit,
            "searching literature"
        );

        let candidates = self.fetch_all(query, limit).await;
        if candidates.is_empty() {
            tracing::info!("no literature found for this query");
            return Ok(Vec::new());
        }

        let mut ranked = self.scorer.rank(query, candidates).await.into_papers();
        ranked.truncate(limit);

        tracing::info!(
            returned = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "literature search completed"
        );
        Ok(ranked)
    }

    /// Same as [`search`](Self::search), for call sites that want the ranked path spelled out.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty query or a zero limit.
    pub async fn search_with_ranking(
        &self,
        query: &str,
        limit: usize,
    ) -> SearchResult<Vec<ScoredPaper>> {
        self.search(query, limit).await
    }

    /// Load the embedding model up front so a broken model is reported
    /// instead of silently degrading every search to unscored results.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Embedding`] if the model cannot be loaded.
    pub async fn load_model(&self) -> SearchResult<()> {
        self.scorer.load_model().await?;
        Ok(())
    }

    /// Rank candidates that were fetched elsewhere. Nothing is truncated.
    pub async fn rank_only(&self, query: &str, candidates: Vec<CandidatePaper>) -> RankOutcome {
        self.scorer.rank(query, candidates).await
    }

    /// Ask every source concurrently and merge in source order.
    async fn fetch_all(&self, query: &str, rows: usize) -> Vec<CandidatePaper> {
        let results = join_all(self.sources.iter().map(|source| source.fetch(query, rows))).await;

        for (source, papers) in self.sources.iter().zip(&results) {
            tracing::info!(source = source.name(), count = papers.len(), "fetched candidates");
        }

        merge_results(results)
    }

    fn validate(&self, query: &str, limit: usize) -> SearchResult<usize> {
        if query.trim().is_empty() {
            return Err(SearchError::validation("query", "cannot be empty"));
        }
        if limit == 0 {
            return Err(SearchError::validation("limit", "must be at least 1"));
        }
        if limit > self.max_limit {
            tracing::debug!(requested = limit, max = self.max_limit, "clamping search limit");
            return Ok(self.max_limit);
        }
        Ok(limit)
    }
}

impl std::fmt::Debug for LiteratureSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteratureSearch")
            .field("sources", &self.source_names())
            .field("scorer", &self.scorer)
            .field("max_limit", &self.max_limit)
            .finish()
    }
}
