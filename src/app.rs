//! Startup: load the corpus, build the index, and assemble the [`Relay`].
//!
//! Everything here runs once, before the gateway connection is opened. Any
//! failure is fatal.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use faq_relay_core::embedding::Embedder;
use faq_relay_core::generation::AnswerGenerator;
use faq_relay_core::index::RetrievalIndex;

use crate::config::Config;
use crate::corpus::load_corpus;
use crate::embedding::create_embedder;
use crate::generation::create_generator;
use crate::listener::{Relay, RelaySettings};

/// Build the relay with the backends named in `config`.
pub async fn build_relay(config: &Config) -> Result<Relay> {
    let embedder = create_embedder(&config.embedding)
        .with_context(|| "Failed to create embedding backend")?;
    let generator = create_generator(&config.generation)
        .with_context(|| "Failed to create generation backend")?;
    build_relay_with(config, embedder, generator).await
}

/// Build the relay with caller-supplied backends.
pub async fn build_relay_with(
    config: &Config,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn AnswerGenerator>,
) -> Result<Relay> {
    let corpus = load_corpus(&config.corpus.path)?;
    let passages = corpus.passages(&config.corpus.split_options());
    info!(
        path = %config.corpus.path.display(),
        bytes = corpus.text.len(),
        fingerprint = %corpus.fingerprint,
        passages = passages.len(),
        "corpus loaded"
    );

    let index = RetrievalIndex::build(passages, embedder.as_ref(), config.embedding.batch_size)
        .await
        .with_context(|| "Failed to build retrieval index")?;
    info!(
        passages = index.len(),
        dims = index.dims(),
        model = index.model(),
        "retrieval index ready"
    );

    let composer = config.prompt.composer()?;
    info!(
        top_k = config.retrieval.top_k,
        max_context_chars = composer.max_context_chars(),
        "prompt composer ready"
    );
    let settings = RelaySettings {
        target_channel_id: config.discord.target_channel_id,
        top_k: config.retrieval.top_k,
        reply_title: config.prompt.reply_title.clone(),
    };

    Ok(Relay::new(
        Arc::new(index),
        embedder,
        composer,
        generator,
        settings,
    ))
}
