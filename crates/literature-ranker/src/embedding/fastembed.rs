//! all-MiniLM-L6-v2 sentence embeddings through fastembed (ONNX, local).
//!
//! Model files are downloaded once into the cache directory; after that no
//! network access is needed.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::EmbeddingProvider;
use crate::error::{EmbeddingError, EmbeddingResult};

/// Local sentence-transformer provider.
#[derive(Clone)]
pub struct FastEmbedProvider {
    /// Inference is serialized through the mutex.
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    embedding_dimension: usize,
}

impl FastEmbedProvider {
    /// Load a model (all-MiniLM-L6-v2 by default). Blocks while the model loads.
    ///
    /// # Errors
    ///
    /// Returns error if model initialization fails.
    pub fn new(model: Option<EmbeddingModel>, cache_dir: Option<String>) -> EmbeddingResult<Self> {
        let model_type = model.unwrap_or(EmbeddingModel::AllMiniLML6V2);
        let model_name = format!("{:?}", model_type);

        let embedding_dimension = match model_type {
            EmbeddingModel::BGEBaseENV15
            | EmbeddingModel::NomicEmbedTextV1
            | EmbeddingModel::NomicEmbedTextV15
            | EmbeddingModel::ParaphraseMLMpnetBaseV2 => 768,
            EmbeddingModel::BGELargeENV15 => 1024,
            _ => 384,
        };

        let mut init_options = InitOptions::new(model_type);
        if let Some(dir) = cache_dir {
            init_options = init_options.with_cache_dir(PathBuf::from(dir));
        }

        let text_embedding = TextEmbedding::try_new(init_options)
            .map_err(|e| EmbeddingError::load(format!("fastembed init failed: {e}")))?;

        Ok(Self { model: Arc::new(Mutex::new(text_embedding)), model_name, embedding_dimension })
    }

    fn embed_blocking(
        model: &Mutex<TextEmbedding>,
        texts: Vec<String>,
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut model = model.lock().map_err(|_| EmbeddingError::inference("model lock poisoned"))?;
        model.embed(texts, None).map_err(|e| EmbeddingError::inference(e.to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::inference("no embedding generated"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|s| (*s).to_string()).collect();

        tokio::task::spawn_blocking(move || Self::embed_blocking(&model, owned))
            .await
            .map_err(|e| EmbeddingError::inference(format!("inference task failed: {e}")))?
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model_name", &self.model_name)
            .field("embedding_dimension", &self.embedding_dimension)
            .finish()
    }
}
