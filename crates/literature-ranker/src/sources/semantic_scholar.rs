//! Semantic Scholar Graph API paper search.

use async_trait::async_trait;
use serde::Deserialize;

use super::{PaperSource, lenient_count, lenient_year, squash_whitespace};
use crate::client::ScholarlyClient;
use crate::config::{Config, fields};
use crate::error::ClientResult;
use crate::models::CandidatePaper;

/// Source tag for Semantic Scholar records.
pub const SOURCE_NAME: &str = "Semantic Scholar";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    r#abstract: Option<String>,
    #[serde(default)]
    authors: Vec<AuthorRef>,
    #[serde(default)]
    year: Option<serde_json::Value>,
    #[serde(default)]
    citation_count: Option<serde_json::Value>,
    #[serde(default)]
    venue: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    #[serde(default)]
    name: Option<String>,
}

impl From<SearchHit> for CandidatePaper {
    fn from(hit: SearchHit) -> Self {
        Self {
            source: SOURCE_NAME.to_string(),
            title: hit.title.as_deref().map(squash_whitespace).unwrap_or_default(),
            r#abstract: hit.r#abstract.as_deref().map(squash_whitespace).unwrap_or_default(),
            authors: hit
                .authors
                .into_iter()
                .filter_map(|a| a.name)
                .filter(|name| !name.trim().is_empty())
                .collect(),
            year: lenient_year(hit.year.as_ref()),
            citations: lenient_count(hit.citation_count.as_ref()),
            venue: hit.venue.filter(|v| !v.trim().is_empty()),
            url: hit.url.unwrap_or_default(),
        }
    }
}

/// Fetches papers from `GET {graph}/paper/search`.
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: ScholarlyClient,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholarSource {
    /// Create a source using the shared client.
    #[must_use]
    pub fn new(client: ScholarlyClient, config: &Config) -> Self {
        Self {
            client,
            base_url: config.semantic_scholar_url.clone(),
            api_key: config.semantic_scholar_api_key.clone(),
        }
    }
}

#[async_trait]
impl PaperSource for SemanticScholarSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn try_fetch(&self, query: &str, rows: usize) -> ClientResult<Vec<CandidatePaper>> {
        let url = format!("{}/paper/search", self.base_url);

        let params = vec![
            ("query".to_string(), query.to_string()),
            ("limit".to_string(), rows.to_string()),
            ("fields".to_string(), fields::SEARCH.join(",")),
        ];

        let headers: Vec<(&'static str, String)> =
            self.api_key.iter().map(|key| ("x-api-key", key.clone())).collect();

        let response: SearchResponse = self.client.get_json(&url, &params, &headers).await?;
        Ok(response.data.into_iter().map(CandidatePaper::from).collect())
    }
}
