//! CrossRef works search.
//!
//! CrossRef wraps everything in `message.items`, stores titles and venues as
//! arrays, splits author names into `given`/`family`, nests the year in
//! `issued.date-parts` and returns abstracts as JATS XML.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use super::{PaperSource, lenient_count, lenient_year, squash_whitespace};
use crate::client::ScholarlyClient;
use crate::config::Config;
use crate::error::ClientResult;
use crate::models::CandidatePaper;

/// Source tag for CrossRef records.
pub const SOURCE_NAME: &str = "CrossRef";

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9:_.-]*[^>]*>").expect("valid markup regex"));

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    message: WorksMessage,
}

#[derive(Debug, Default, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<Work>,
}

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    #[serde(default)]
    author: Vec<WorkAuthor>,
    #[serde(default)]
    issued: Option<PartialDate>,
    #[serde(rename = "is-referenced-by-count", default)]
    citation_count: Option<serde_json::Value>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(rename = "URL", default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkAuthor {
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl WorkAuthor {
    /// "given family", falling back to the organisation `name`.
    fn display_name(self) -> Option<String> {
        let joined = [self.given, self.family]
            .into_iter()
            .flatten()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() {
            self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
        } else {
            Some(joined)
        }
    }
}

#[derive(Debug, Deserialize)]
struct PartialDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<serde_json::Value>>,
}

impl PartialDate {
    fn year(&self) -> Option<i32> {
        lenient_year(self.date_parts.first()?.first())
    }
}

/// Strip JATS/HTML tags from an abstract and collapse whitespace.
fn strip_markup(text: &str) -> String {
    squash_whitespace(&MARKUP.replace_all(text, " "))
}

impl From<Work> for CandidatePaper {
    fn from(work: Work) -> Self {
        Self {
            source: SOURCE_NAME.to_string(),
            title: work.title.first().map(|t| squash_whitespace(t)).unwrap_or_default(),
            r#abstract: work.abstract_text.as_deref().map(strip_markup).unwrap_or_default(),
            year: work.issued.as_ref().and_then(PartialDate::year),
            citations: lenient_count(work.citation_count.as_ref()),
            venue: work.container_title.into_iter().next().filter(|v| !v.trim().is_empty()),
            url: work.url.unwrap_or_default(),
            authors: work.author.into_iter().filter_map(WorkAuthor::display_name).collect(),
        }
    }
}

/// Fetches papers from `GET {crossref}/works`.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: ScholarlyClient,
    base_url: String,
    mailto: Option<String>,
}

impl CrossRefSource {
    /// Create a source using the shared client.
    #[must_use]
    pub fn new(client: ScholarlyClient, config: &Config) -> Self {
        Self {
            client,
            base_url: config.crossref_url.trim_end_matches('/').to_string(),
            mailto: config.crossref_mailto.clone(),
        }
    }
}

#[async_trait]
impl PaperSource for CrossRefSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn try_fetch(&self, query: &str, rows: usize) -> ClientResult<Vec<CandidatePaper>> {
        let url = format!("{}/works", self.base_url);

        let mut params = vec![
            ("query".to_string(), query.to_string()),
            ("rows".to_string(), rows.to_string()),
        ];
        if let Some(ref mailto) = self.mailto {
            params.push(("mailto".to_string(), mailto.clone()));
        }

        let response: WorksResponse = self.client.get_json(&url, &params, &[]).await?;
        Ok(response.message.items.into_iter().map(CandidatePaper::from).collect())
    }
}
