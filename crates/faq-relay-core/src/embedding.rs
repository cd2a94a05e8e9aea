//! Embedding trait and vector utilities.
//!
//! Defines the [`Embedder`] capability that every embedding backend
//! implements, plus the pure similarity helper the retrieval index uses.
//!
//! Concrete backends (OpenAI, Ollama, fastembed) live in the `faq-relay`
//! app crate.

use async_trait::async_trait;

use crate::error::RelayError;

/// An external service that turns text into fixed-dimension vectors.
///
/// Implementations must return exactly one vector per input text, in input
/// order. Failures surface as [`RelayError::EmbeddingService`] and are not
/// retried by callers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RelayError>;
}

/// Embed a single query text.
///
/// Convenience wrapper around [`Embedder::embed`] for the per-message
/// query path.
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>, RelayError> {
    let results = embedder.embed(&[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| RelayError::embedding("empty embedding response"))
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
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
