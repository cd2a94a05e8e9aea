//! # FAQ Relay Core
//!
//! Shared, I/O-free logic for FAQ Relay: passages, corpus splitting, the
//! in-memory retrieval index, prompt composition, and the service traits
//! (`Embedder`, `AnswerGenerator`) that external backends implement.
//!
//! This crate contains no tokio, reqwest, filesystem I/O, or chat-platform
//! dependencies. Backends and the listener live in the `faq-relay` crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod models;
pub mod prompt;

pub use error::RelayError;
