//! Feature-hashing bag-of-words embedder.
//!
//! Each lowercase word (minus a short stop list) is hashed into one of
//! `dimension` buckets with a hash-derived sign, then the vector is
//! L2-normalized. Texts that share vocabulary get a high cosine similarity.
//! Output is deterministic across runs and platforms.

use async_trait::async_trait;
use md5::{Digest, Md5};

use super::EmbeddingProvider;
use crate::error::EmbeddingResult;

/// Default vector length, matching all-MiniLM-L6-v2.
pub const DEFAULT_DIMENSION: usize = 384;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it", "of",
    "on", "or", "that", "the", "this", "to", "was", "what", "which", "with",
];

/// Deterministic local embedder with no model files.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing `dimension`-length vectors (at least 1).
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    /// Synchronous embedding; the async trait method delegates here.
    #[must_use]
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for token in tokenize(text) {
            let digest = Md5::digest(token.as_bytes());
            let mut index_bytes = [0_u8; 8];
            index_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(index_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

/// Lowercase alphanumeric words, stop words removed.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "feature-hashing-bow"
    }
}
