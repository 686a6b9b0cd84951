//! Configuration for the literature ranker.

use std::time::Duration;

use anyhow::Context;

use crate::embedding::EmbeddingBackend;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Semantic Scholar Graph API endpoint.
    pub const SEMANTIC_SCHOLAR_API: &str = "https://api.semanticscholar.org/graph/v1";

    /// CrossRef REST API endpoint.
    pub const CROSSREF_API: &str = "https://api.crossref.org";

    /// Request timeout per external call.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Delay before each request without a Semantic Scholar key (200ms = 5 req/s).
    pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(200);

    /// Delay before each request with a Semantic Scholar key (10ms = 100 req/s).
    pub const RATE_LIMIT_DELAY_WITH_KEY: Duration = Duration::from_millis(10);

    /// Retries for transient transport errors.
    pub const MAX_RETRIES: u32 = 3;

    /// Cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);

    /// User agent sent to every source.
    pub const USER_AGENT: &str = concat!("literature-ranker/", env!("CARGO_PKG_VERSION"));
}

/// Result-count limits.
pub mod limits {
    /// Limit used by direct searches when none is given.
    pub const DEFAULT_SEARCH_LIMIT: usize = 10;

    /// Largest limit a direct search accepts; larger requests are clamped.
    pub const MAX_SEARCH_LIMIT: usize = 50;

    /// Papers kept per sub-question in the workflow path.
    pub const PAPERS_PER_SUB_QUESTION: usize = 2;

    /// Sub-questions searched per workflow run.
    pub const MAX_SUB_QUESTIONS: usize = 10;
}

/// Semantic Scholar paper fields requested by the fetcher.
pub mod fields {
    /// Fields needed to build a candidate paper.
    pub const SEARCH: &[&str] = &["title", "abstract", "authors", "year", "citationCount", "url", "venue"];
}

/// Ranker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Semantic Scholar API key (optional).
    pub semantic_scholar_api_key: Option<String>,

    /// Contact address for the CrossRef polite pool (optional).
    pub crossref_mailto: Option<String>,

    /// Base URL for the Semantic Scholar Graph API (for testing with mock servers).
    pub semantic_scholar_url: String,

    /// Base URL for the CrossRef API (for testing with mock servers).
    pub crossref_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Delay before each outgoing request.
    pub rate_limit_delay: Duration,

    /// Retries for transient failures.
    pub max_retries: u32,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,

    /// Limit used when a caller does not pass one.
    pub default_search_limit: usize,

    /// Upper bound for the search limit.
    pub max_search_limit: usize,

    /// Which embedding model backs relevance scoring.
    pub embedding_backend: EmbeddingBackend,

    /// Directory where downloaded model files are cached.
    pub model_cache_dir: Option<String>,
}

impl Config {
    /// Create a new configuration with optional credentials.
    ///
    /// The request delay is shortened when a Semantic Scholar key is present:
    /// - Without key: 5 req/s
    /// - With key: 100 req/s
    #[must_use]
    pub fn new(semantic_scholar_api_key: Option<String>, crossref_mailto: Option<String>) -> Self {
        let rate_limit_delay = Self::rate_limit_for(semantic_scholar_api_key.is_some());
        Self {
            semantic_scholar_api_key,
            crossref_mailto,
            semantic_scholar_url: api::SEMANTIC_SCHOLAR_API.to_string(),
            crossref_url: api::CROSSREF_API.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            rate_limit_delay,
            max_retries: api::MAX_RETRIES,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
            default_search_limit: limits::DEFAULT_SEARCH_LIMIT,
            max_search_limit: limits::MAX_SEARCH_LIMIT,
            embedding_backend: EmbeddingBackend::default(),
            model_cache_dir: None,
        }
    }

    /// Replace the Semantic Scholar key, keeping the request delay in step with it.
    pub fn set_api_key(&mut self, key: Option<String>) {
        self.rate_limit_delay = Self::rate_limit_for(key.is_some());
        self.semantic_scholar_api_key = key;
    }

    const fn rate_limit_for(has_key: bool) -> Duration {
        if has_key { api::RATE_LIMIT_DELAY_WITH_KEY } else { api::RATE_LIMIT_DELAY }
    }

    /// Create a test configuration pointing both sources at one mock server.
    ///
    /// Semantic Scholar is served under `/graph/v1`, CrossRef at the root.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            semantic_scholar_api_key: None,
            crossref_mailto: None,
            semantic_scholar_url: format!("{}/graph/v1", base_url),
            crossref_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            rate_limit_delay: Duration::from_millis(0), // No delay in tests
            max_retries: 0,
            cache_ttl: Duration::from_secs(0), // No caching in tests
            cache_max_size: 0,
            default_search_limit: limits::DEFAULT_SEARCH_LIMIT,
            max_search_limit: limits::MAX_SEARCH_LIMIT,
            embedding_backend: EmbeddingBackend::Hashing,
            model_cache_dir: None,
        }
    }

    /// Create configuration from environment variables (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let api_key = std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok().filter(|k| !k.is_empty());
        let mailto = std::env::var("CROSSREF_MAILTO").ok().filter(|m| !m.is_empty());
        let mut config = Self::new(api_key, mailto);

        if let Ok(url) = std::env::var("SEMANTIC_SCHOLAR_API_URL") {
            config.semantic_scholar_url = url;
        }
        if let Ok(url) = std::env::var("CROSSREF_API_URL") {
            config.crossref_url = url;
        }
        if let Ok(limit) = std::env::var("DEFAULT_SEARCH_LIMIT") {
            config.default_search_limit =
                limit.parse().context("DEFAULT_SEARCH_LIMIT must be a positive integer")?;
        }
        if let Ok(limit) = std::env::var("MAX_SEARCH_LIMIT") {
            config.max_search_limit =
                limit.parse().context("MAX_SEARCH_LIMIT must be a positive integer")?;
        }
        if let Ok(backend) = std::env::var("EMBEDDING_BACKEND") {
            config.embedding_backend = backend.parse().map_err(anyhow::Error::msg)?;
        }
        config.model_cache_dir = std::env::var("EMBEDDING_CACHE_DIR").ok();

        config.validate()?;
        Ok(config)
    }

    /// Check that URLs parse and limits are coherent.
    ///
    /// # Errors
    ///
    /// Returns error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.semantic_scholar_url)
            .with_context(|| format!("invalid Semantic Scholar URL: {}", self.semantic_scholar_url))?;
        url::Url::parse(&self.crossref_url)
            .with_context(|| format!("invalid CrossRef URL: {}", self.crossref_url))?;

        if self.max_search_limit == 0 {
            anyhow::bail!("MAX_SEARCH_LIMIT must be at least 1");
        }
        if self.default_search_limit == 0 || self.default_search_limit > self.max_search_limit {
            anyhow::bail!(
                "DEFAULT_SEARCH_LIMIT must be between 1 and {}",
                self.max_search_limit
            );
        }
        Ok(())
    }

    /// Check if a Semantic Scholar API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.semantic_scholar_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}
