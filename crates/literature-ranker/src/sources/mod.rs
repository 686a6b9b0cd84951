//! Bibliographic source fetchers.
//!
//! Each source queries one external API and normalizes its response into
//! [`CandidatePaper`] records. Sources never fail: transport errors, bad
//! statuses and malformed bodies are logged and turn into an empty result, so
//! one broken source cannot abort a search.

mod crossref;
mod semantic_scholar;

pub use crossref::CrossRefSource;
pub use semantic_scholar::SemanticScholarSource;

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ScholarlyClient;
use crate::config::Config;
use crate::error::ClientResult;
use crate::models::CandidatePaper;

/// A pluggable bibliographic source.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Source tag written into every record (e.g. "CrossRef").
    fn name(&self) -> &'static str;

    /// Query the API and normalize up to `rows` records.
    async fn try_fetch(&self, query: &str, rows: usize) -> ClientResult<Vec<CandidatePaper>>;

    /// Fetch up to `rows` records, degrading any failure to an empty list.
    async fn fetch(&self, query: &str, rows: usize) -> Vec<CandidatePaper> {
        match self.try_fetch(query, rows).await {
            Ok(mut papers) => {
                papers.truncate(rows);
                tracing::debug!(source = self.name(), count = papers.len(), "source returned papers");
                papers
            }
            Err(error) => {
                tracing::warn!(source = self.name(), %error, "source failed, continuing without it");
                Vec::new()
            }
        }
    }
}

/// The standard source list: Semantic Scholar first, then CrossRef.
///
/// The order is the merge order and therefore the tie-break order of the ranking.
#[must_use]
pub fn default_sources(client: &ScholarlyClient, config: &Config) -> Vec<Arc<dyn PaperSource>> {
    vec![
        Arc::new(SemanticScholarSource::new(client.clone(), config)),
        Arc::new(CrossRefSource::new(client.clone(), config)),
    ]
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub(crate) fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read a year from a JSON value that may be a number or a numeric string.
pub(crate) fn lenient_year(value: Option<&serde_json::Value>) -> Option<i32> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a non-negative count from a JSON value, defaulting to 0.
pub(crate) fn lenient_count(value: Option<&serde_json::Value>) -> u32 {
    value
        .and_then(serde_json::Value::as_u64)
        .map(|c| u32::try_from(c).unwrap_or(u32::MAX))
        .unwrap_or(0)
}
