//! In-memory retrieval index.
//!
//! Holds one embedding vector per [`Passage`] and answers nearest-neighbour
//! queries by brute-force cosine similarity. The index is built once during
//! startup and is read-only afterwards, so it can be shared by `Arc` across
//! any number of concurrent message tasks without locking.
//!
//! Ranking is by descending similarity. Passages with equal scores are
//! ordered by ascending `source_offset`, so results never depend on
//! insertion order or platform sort stability.
//!
//! Vectors with NaN or infinite components are rejected at build and query
//! time. A score that still comes out NaN (a finite vector whose norm
//! overflows) ranks below every real score.

use crate::embedding::{cosine_similarity, embed_query, Embedder};
use crate::error::RelayError;
use crate::models::{Passage, RetrievalResult, ScoredPassage};

struct IndexedPassage {
    passage: Passage,
    vector: Vec<f32>,
}

/// A similarity-searchable collection of embedded passages.
pub struct RetrievalIndex {
    entries: Vec<IndexedPassage>,
    dims: usize,
    model: String,
}

impl RetrievalIndex {
    /// Embed every passage and build the index.
    ///
    /// Passages are sent to the embedder in batches of `batch_size`. Fails
    /// with [`RelayError::EmbeddingService`] if any batch fails, returns the
    /// wrong number of vectors, or vectors of inconsistent dimension.
    pub async fn build(
        passages: Vec<Passage>,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self, RelayError> {
        let batch_size = batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(passages.len());

        for batch in passages.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|p| p.content.clone()).collect();
            let embedded = embedder.embed(&texts).await?;
            if embedded.len() != texts.len() {
                return Err(RelayError::EmbeddingService(format!(
                    "expected {} vectors, got {}",
                    texts.len(),
                    embedded.len()
                )));
            }
            vectors.extend(embedded);
        }

        Self::from_vectors(passages, vectors, embedder.model_name())
    }

    /// Build an index from precomputed vectors.
    pub fn from_vectors(
        passages: Vec<Passage>,
        vectors: Vec<Vec<f32>>,
        model: &str,
    ) -> Result<Self, RelayError> {
        if passages.len() != vectors.len() {
            return Err(RelayError::EmbeddingService(format!(
                "{} passages but {} vectors",
                passages.len(),
                vectors.len()
            )));
        }

        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(RelayError::EmbeddingService(format!(
                "inconsistent embedding dimensions: {} vs {}",
                dims,
                bad.len()
            )));
        }
        if let Some(row) = vectors.iter().position(|v| !all_finite(v)) {
            return Err(RelayError::EmbeddingService(format!(
                "embedding {} has a non-finite component",
                row
            )));
        }

        let entries = passages
            .into_iter()
            .zip(vectors)
            .map(|(passage, vector)| IndexedPassage { passage, vector })
            .collect();

        Ok(Self {
            entries,
            dims,
            model: model.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimensionality, or 0 for an empty index.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Model the stored vectors were produced with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Return the `k` passages most similar to `query_vec`, best first.
    pub fn search(&self, query_vec: &[f32], k: usize) -> RetrievalResult {
        let mut hits: Vec<ScoredPassage> = self
            .entries
            .iter()
            .map(|e| ScoredPassage {
                passage: e.passage.clone(),
                score: cosine_similarity(query_vec, &e.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            rank_score(b.score)
                .total_cmp(&rank_score(a.score))
                .then_with(|| a.passage.source_offset.cmp(&b.passage.source_offset))
        });
        hits.truncate(k);

        RetrievalResult { hits }
    }

    /// Embed `text` with `embedder` and return the top `k` passages.
    ///
    /// `embedder` must be the one the index was built with; vectors from a
    /// different model are not comparable.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        embedder: &dyn Embedder,
    ) -> Result<RetrievalResult, RelayError> {
        let query_vec = embed_query(embedder, text).await?;
        if self.dims != 0 && query_vec.len() != self.dims {
            return Err(RelayError::EmbeddingService(format!(
                "query vector has {} dimensions, index has {}",
                query_vec.len(),
                self.dims
            )));
        }
        if !all_finite(&query_vec) {
            return Err(RelayError::embedding(
                "query embedding has a non-finite component",
            ));
        }
        Ok(self.search(&query_vec, k))
    }
}

fn all_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Sort key for a similarity score. NaN ranks below every real score.
fn rank_score(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
