//! Literature Ranker
//!
//! Finds academic papers relevant to a research question. Candidates are
//! fetched from Semantic Scholar and CrossRef, merged, and ranked by semantic
//! similarity to the query weighted by recency and citation impact.
//!
//! # Features
//!
//! - **Two sources**: Semantic Scholar Graph API and CrossRef works, queried concurrently
//! - **Fault tolerant**: a failing source contributes nothing instead of aborting
//! - **Confidence tiers**: every ranked paper carries a tier, hierarchy rank and label
//! - **Lazy model**: the embedding model loads on first use and is shared process-wide
//! - **Cached**: 5-minute TTL response cache with retrying HTTP middleware
//!
//! # Example
//!
//! ```no_run
//! use literature_ranker::{Config, LiteratureSearch};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let search = LiteratureSearch::from_config(&config)?;
//!
//!     for paper in search.search("malaria prevention in rural clinics", 5).await? {
//!         println!("{:?} {}", paper.relevance, paper.paper.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod embedding;
pub mod error;
pub mod formatters;
pub mod models;
pub mod ranking;
pub mod search;
pub mod sources;
pub mod workflow;

pub use client::ScholarlyClient;
pub use config::Config;
pub use error::{ClientError, EmbeddingError, SearchError};
pub use search::LiteratureSearch;
