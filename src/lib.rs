//! # FAQ Relay
//!
//! A retrieval-augmented question-answering relay for one Discord channel.
//!
//! At startup the relay splits a text corpus into passages and embeds them
//! into an in-memory index. Each qualifying message in the target channel
//! is then answered by retrieving the closest passages, composing them into
//! a system instruction, and asking a hosted chat model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Corpus  │──▶│ Split+Embed  │──▶│ Retrieval    │   (startup)
//! │  file    │   │              │   │ Index        │
//! └──────────┘   └──────────────┘   └──────┬───────┘
//!                                          │ query
//! ┌──────────┐   ┌──────────────┐   ┌──────▼───────┐   ┌───────────┐
//! │ Discord  │──▶│   Listener   │──▶│   Prompt     │──▶│ Chat      │
//! │ gateway  │◀──│   (Relay)    │◀──│   Composer   │   │ model     │
//! └──────────┘   └──────────────┘   └──────────────┘   └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment credentials |
//! | [`corpus`] | Corpus file loading |
//! | [`embedding`] | Embedding backends (OpenAI, Ollama, local) |
//! | [`generation`] | Chat-model backend |
//! | [`listener`] | Filtering, answer pipeline, replies |
//! | [`discord`] | Discord gateway adapter |
//! | [`app`] | Startup assembly |
//! | [`logging`] | Diagnostic output |

pub mod app;
pub mod config;
pub mod corpus;
pub mod discord;
pub mod embedding;
pub mod generation;
pub mod listener;
pub mod logging;
