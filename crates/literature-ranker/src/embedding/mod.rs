//! Text embedding backends and the shared, lazily-loaded model handle.
//!
//! The scorer only needs one thing from a model: fixed-length vectors whose
//! cosine similarity says how close two texts are. Backends implement
//! [`EmbeddingProvider`]; [`SharedEmbedder`] wraps one behind a compute-once
//! initializer so the model is loaded on first use and then reused by every
//! search for the lifetime of the process.

#[cfg(feature = "fastembed")]
mod fastembed;
mod hashing;

#[cfg(feature = "fastembed")]
pub use self::fastembed::FastEmbedProvider;
pub use hashing::HashingEmbedder;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::{EmbeddingError, EmbeddingResult};

/// Trait for text embedding providers.
///
/// Implementations must be safe to call from concurrent searches.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for the given text.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Generate embeddings for several texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Number of dimensions in every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}

/// Which model backs relevance scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingBackend {
    /// Local feature-hashing bag of words. Needs no model files; lexical only.
    #[cfg_attr(not(feature = "fastembed"), default)]
    Hashing,
    /// all-MiniLM-L6-v2 through fastembed (requires the `fastembed` feature).
    #[cfg_attr(feature = "fastembed", default)]
    FastEmbed,
}

impl EmbeddingBackend {
    /// Build the provider for this backend. Loading a real model is slow.
    ///
    /// # Errors
    ///
    /// Returns error if the model cannot be loaded or the backend was not compiled in.
    pub fn load(self, cache_dir: Option<String>) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
        match self {
            Self::Hashing => Ok(Arc::new(HashingEmbedder::default())),
            #[cfg(feature = "fastembed")]
            Self::FastEmbed => Ok(Arc::new(FastEmbedProvider::new(None, cache_dir)?)),
            #[cfg(not(feature = "fastembed"))]
            Self::FastEmbed => {
                let _ = cache_dir;
                Err(EmbeddingError::load("built without the `fastembed` feature"))
            }
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "fastembed" | "minilm" => Ok(Self::FastEmbed),
            other => Err(format!("unknown embedding backend '{other}' (expected hashing or fastembed)")),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hashing => f.write_str("hashing"),
            Self::FastEmbed => f.write_str("fastembed"),
        }
    }
}

type Loader = Arc<dyn Fn() -> EmbeddingResult<Arc<dyn EmbeddingProvider>> + Send + Sync>;

static GLOBAL: OnceLock<Arc<SharedEmbedder>> = OnceLock::new();

/// A model handle that is built on first use and then shared.
///
/// Cloning the surrounding `Arc` shares the same model; the loader runs at
/// most once even under concurrent first calls.
pub struct SharedEmbedder {
    cell: OnceCell<Arc<dyn EmbeddingProvider>>,
    loader: Loader,
}

impl SharedEmbedder {
    /// Lazily load `backend` on first use.
    #[must_use]
    pub fn lazy(backend: EmbeddingBackend, cache_dir: Option<String>) -> Self {
        Self::with_loader(move || backend.load(cache_dir.clone()))
    }

    /// Lazily run a custom loader on first use.
    #[must_use]
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> EmbeddingResult<Arc<dyn EmbeddingProvider>> + Send + Sync + 'static,
    {
        Self { cell: OnceCell::new(), loader: Arc::new(loader) }
    }

    /// Wrap an already constructed provider.
    #[must_use]
    pub fn from_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let fallback = Arc::clone(&provider);
        Self {
            cell: OnceCell::new_with(Some(provider)),
            loader: Arc::new(move || Ok(Arc::clone(&fallback))),
        }
    }

    /// The process-wide instance. The first caller's backend wins.
    #[must_use]
    pub fn global(backend: EmbeddingBackend, cache_dir: Option<String>) -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::lazy(backend, cache_dir))))
    }

    /// Whether the model has been loaded yet.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the model, loading it on the blocking pool if this is the first call.
    ///
    /// A failed load is not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns error if the loader fails.
    pub async fn get(&self) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
        let provider = self
            .cell
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let started = std::time::Instant::now();
                tracing::info!("loading embedding model (one-time setup)");

                let provider = tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(|e| EmbeddingError::load(format!("loader task failed: {e}")))??;

                tracing::info!(
                    model = provider.model_name(),
                    dimension = provider.dimension(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "embedding model ready"
                );
                Ok::<_, EmbeddingError>(provider)
            })
            .await?;

        Ok(Arc::clone(provider))
    }
}

impl fmt::Debug for SharedEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEmbedder").field("initialized", &self.is_initialized()).finish()
    }
}

/// Cosine similarity of two vectors.
///
/// A zero vector has no direction, so its similarity to anything is 0.
///
/// # Errors
///
/// Returns error if the vectors have different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> EmbeddingResult<f64> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch { expected: a.len(), actual: b.len() });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}
