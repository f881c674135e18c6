//! Embedding trait and vector utilities.
//!
//! Defines the [`Embedder`] trait that every embedding backend implements,
//! plus pure helpers for vector serialization and similarity computation.
//!
//! Concrete providers (OpenAI, Ollama) live in the `docze` app crate.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// A black-box text embedding model.
///
/// Implementations must be deterministic enough that embedding the same text
/// twice yields vectors that rank identically; the engine never re-embeds
/// stored text to check.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning vectors in input order.
    ///
    /// The default embeds one text at a time; HTTP providers override this
    /// to send a whole batch per request.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// Each `f32` is stored as 4 bytes in little-endian order, producing
/// a BLOB of `vec.len() × 4` bytes.
///
/// # Example
///
/// ```rust
/// use docze_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12); // 3 × 4 bytes
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
///
/// Reverses [`vec_to_blob`]. Trailing bytes that do not form a whole `f32`
/// are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns `Some` value in `[-1.0, 1.0]`, or `None` when the similarity is
/// undefined: empty vectors, vectors of different lengths, or a zero-norm
/// vector on either side.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some((dot / norm_a.sqrt() / norm_b.sqrt()).clamp(-1.0, 1.0))
}

/// SHA-256 hex digest of a text, stored next to its embedding so a vector
/// can always be traced back to the exact text it was computed from.
pub fn text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
