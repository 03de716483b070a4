//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, plus pure helpers for vector serialization, similarity, and
//! the distance → relevance mapping used by vector search.
//!
//! Concrete providers (OpenAI, Ollama, fastembed) live in the
//! `scripture-harness` app crate.

use anyhow::Result;
use async_trait::async_trait;

/// Highest relevance the vector comparator may report. `1.0` is reserved
/// for exact-reference matches.
pub const MAX_VECTOR_SIMILARITY: f64 = 0.9999;

/// Trait for embedding providers.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector for a given model.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"paraphrase-multilingual-minilm-l12-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed one text into the index's vector space.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// # Example
///
/// ```rust
/// use scripture_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors or
/// vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Map a cosine distance in `[0, 2]` to a relevance score.
///
/// `similarity = 1 - distance / 2`, clamped to
/// `[0, MAX_VECTOR_SIMILARITY]` and rounded to four decimals so repeated
/// runs compare equal.
pub fn distance_to_similarity(distance: f64) -> f64 {
    if !distance.is_finite() {
        return 0.0;
    }
    let sim = (1.0 - distance / 2.0).clamp(0.0, MAX_VECTOR_SIMILARITY);
    (sim * 10_000.0).round() / 10_000.0
}
