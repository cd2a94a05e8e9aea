//! Core data models that flow through the relay pipeline.

use serde::Serialize;

/// An immutable unit of corpus text, produced once when the corpus is split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub content: String,
    /// Byte offset of the first character of `content` in the corpus.
    pub source_offset: usize,
}

impl Passage {
    pub fn new(content: impl Into<String>, source_offset: usize) -> Self {
        Self {
            content: content.into(),
            source_offset,
        }
    }
}

/// A passage paired with its similarity to a query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f32,
}

/// Passages ranked by similarity to a query, best first.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredPassage>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Passages in rank order, without their scores.
    pub fn passages(&self) -> Vec<Passage> {
        self.hits.iter().map(|h| h.passage.clone()).collect()
    }
}
