//! Error types for the literature ranker.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Source failures never leave the fetcher layer; they are listed here so the
//! fetchers can classify what they swallow.

use std::time::Duration;

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Rate limited by the upstream API (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_) | Self::Server { .. })
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Errors from the embedding backend.
#[derive(thiserror::Error, Debug)]
pub enum EmbeddingError {
    /// The model could not be constructed.
    #[error("failed to load embedding model: {reason}")]
    ModelLoadFailed {
        /// Backend-specific failure description
        reason: String,
    },

    /// The backend failed while embedding text.
    #[error("embedding inference failed: {reason}")]
    InferenceFailed {
        /// Backend-specific failure description
        reason: String,
    },

    /// Two vectors that should be comparable have different lengths.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the first vector
        expected: usize,
        /// Dimension of the second vector
        actual: usize,
    },
}

impl EmbeddingError {
    /// Create an inference failure.
    #[must_use]
    pub fn inference(reason: impl Into<String>) -> Self {
        Self::InferenceFailed { reason: reason.into() }
    }

    /// Create a model load failure.
    #[must_use]
    pub fn load(reason: impl Into<String>) -> Self {
        Self::ModelLoadFailed { reason: reason.into() }
    }
}

/// Errors surfaced by the search orchestrator.
#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    /// Input validation failed before any network call was made.
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// The embedding model failed while being loaded ahead of a search
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl SearchError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Convert to a user-friendly error message for CLI output.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            Self::Embedding(EmbeddingError::ModelLoadFailed { reason }) => {
                format!("The embedding model could not be loaded: {reason}")
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
