//! The [`EmbeddingProvider`] seam plus the vector math the stores share.
//!
//! Backends (Ollama, OpenAI) are implemented in the `positron` crate; this
//! module only fixes the contract they satisfy and how vectors are packed
//! and compared once they come back.

use async_trait::async_trait;

use crate::error::Result;

/// Text to fixed-length vector.
///
/// Every vector returned must have exactly [`dims`](EmbeddingProvider::dims)
/// components. [`VectorIndex`](crate::index::VectorIndex) rejects anything
/// else as a configuration error.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn model_name(&self) -> &str;

    fn dims(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Pack a vector for storage as little-endian `f32` words.
///
/// ```rust
/// use positron_core::embedding::{blob_to_vec, vec_to_blob};
///
/// let v = vec![0.25f32, -8.0];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 8);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Inverse of [`vec_to_blob`]. A trailing partial word is dropped.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .filter_map(|word| word.try_into().ok().map(f32::from_le_bytes))
        .collect()
}

/// Cosine of the angle between `a` and `b`.
///
/// Length mismatches, empty input, and zero vectors all score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, aa, bb) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, aa, bb), (x, y)| {
            (dot + x * y, aa + x * x, bb + y * y)
        });

    let norm = (aa * bb).sqrt();
    if norm <= f32::EPSILON {
        0.0
    } else {
        dot / norm
    }
}

/// `1 - cosine_similarity`; stores rank nearest-first on this.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}
