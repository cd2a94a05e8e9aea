//! Error taxonomy shared by every stage of the relay.
//!
//! Startup errors ([`RelayError::CorpusUnavailable`],
//! [`RelayError::MissingCredential`], [`RelayError::InvalidTemplate`]) abort
//! the process. The per-request kinds are caught by the listener and turned
//! into the generic error reply.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("corpus unavailable at {path}: {reason}")]
    CorpusUnavailable { path: String, reason: String },

    #[error("missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    #[error("generation service error: {0}")]
    GenerationService(String),

    #[error("outbound send error: {0}")]
    OutboundSend(String),
}

impl RelayError {
    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        RelayError::EmbeddingService(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        RelayError::GenerationService(err.to_string())
    }

    pub fn outbound<E: std::fmt::Display>(err: E) -> Self {
        RelayError::OutboundSend(err.to_string())
    }
}
