//! Channel listener: message filtering, the answer pipeline, and replies.
//!
//! [`Relay`] is platform-independent. A gateway adapter (see
//! [`crate::discord`]) converts platform events into [`InboundMessage`]s,
//! calls [`Relay::handle`] once per event, and provides a [`ReplySink`] for
//! the outbound side.
//!
//! # Per-message lifecycle
//!
//! ```text
//!   Idle ──message──▶ Processing ──reply sent (answer or error)──▶ Idle
//! ```
//!
//! Every inbound event runs in its own task. Tasks share the read-only
//! index and the stateless service clients and nothing else, so nothing is
//! locked; replies to overlapping questions may go out in any order.
//!
//! # Failure handling
//!
//! Any error while answering is logged with its detail and turned into one
//! generic error reply. Errors never escape [`Relay::handle`], so a failing
//! message cannot stop the listener from serving the next one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use faq_relay_core::embedding::Embedder;
use faq_relay_core::generation::AnswerGenerator;
use faq_relay_core::index::RetrievalIndex;
use faq_relay_core::prompt::{truncate_chars, PromptComposer};
use faq_relay_core::RelayError;

/// The only text users ever see when something goes wrong.
pub const ERROR_REPLY_TEXT: &str = "Sorry, I was unable to process your question.";
pub const ERROR_REPLY_TITLE: &str = "Error";
/// Longest reply description the channel accepts.
pub const MAX_DESCRIPTION_CHARS: usize = 4096;
pub const ANSWER_COLOR: u32 = 0x3498DB;
pub const ERROR_COLOR: u32 = 0xE74C3C;

/// An inbound chat message, as delivered by the gateway.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author_id: u64,
    pub author_display_name: String,
    pub channel_id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_bot: bool,
}

/// A structured outbound reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer_text: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Reply {
    /// Successful answer to `msg`. The description is cut to
    /// [`MAX_DESCRIPTION_CHARS`].
    pub fn answer(title: &str, answer: &str, msg: &InboundMessage) -> Self {
        Self {
            title: title.to_string(),
            description: truncate_chars(answer, MAX_DESCRIPTION_CHARS).to_string(),
            color: ANSWER_COLOR,
            footer_text: Some(format!("Asked by: {}", msg.author_display_name)),
            timestamp: Some(msg.created_at),
        }
    }

    /// The generic error reply.
    pub fn error() -> Self {
        Self {
            title: ERROR_REPLY_TITLE.to_string(),
            description: ERROR_REPLY_TEXT.to_string(),
            color: ERROR_COLOR,
            footer_text: None,
            timestamp: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.color == ERROR_COLOR && self.description == ERROR_REPLY_TEXT
    }
}

/// Outbound side of the channel.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Send `reply` to `channel_id`. Failures are [`RelayError::OutboundSend`].
    async fn send(&self, channel_id: u64, reply: &Reply) -> Result<(), RelayError>;
}

/// Why a message was not answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    BotAuthor,
    OtherChannel,
}

/// What [`Relay::handle`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Filtered out; no service was called and nothing was sent.
    Ignored(IgnoreReason),
    /// The answer reply was delivered.
    Answered,
    /// Answering failed and the generic error reply was delivered.
    ErrorReplied,
    /// No reply could be delivered.
    SendFailed,
}

/// Listener settings taken from configuration.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub target_channel_id: u64,
    pub top_k: usize,
    pub reply_title: String,
}

/// The question-answering pipeline behind one channel.
pub struct Relay {
    index: Arc<RetrievalIndex>,
    embedder: Arc<dyn Embedder>,
    composer: PromptComposer,
    generator: Arc<dyn AnswerGenerator>,
    settings: RelaySettings,
    in_flight: AtomicUsize,
}

/// Counts a message as Processing until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> (Self, usize) {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (Self(counter), now)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Relay {
    pub fn new(
        index: Arc<RetrievalIndex>,
        embedder: Arc<dyn Embedder>,
        composer: PromptComposer,
        generator: Arc<dyn AnswerGenerator>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            index,
            embedder,
            composer,
            generator,
            settings,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Number of messages currently being processed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Decide whether `msg` qualifies. `None` means it does.
    pub fn screen(&self, msg: &InboundMessage) -> Option<IgnoreReason> {
        if msg.is_bot {
            return Some(IgnoreReason::BotAuthor);
        }
        if msg.channel_id != self.settings.target_channel_id {
            return Some(IgnoreReason::OtherChannel);
        }
        None
    }

    /// Retrieve, compose, and generate an answer for `question`.
    pub async fn answer(&self, question: &str) -> Result<String, RelayError> {
        let retrieved = self
            .index
            .query(question, self.settings.top_k, self.embedder.as_ref())
            .await?;
        debug!(
            hits = retrieved.len(),
            offsets = ?retrieved.hits.iter().map(|h| h.passage.source_offset).collect::<Vec<_>>(),
            "retrieved passages"
        );

        let system_instruction = self.composer.compose(&retrieved.passages());
        self.generator.generate(&system_instruction, question).await
    }

    /// Handle one inbound message, sending at most one reply.
    pub async fn handle(&self, msg: &InboundMessage, sink: &dyn ReplySink) -> Outcome {
        if let Some(reason) = self.screen(msg) {
            debug!(
                author_id = msg.author_id,
                channel_id = msg.channel_id,
                ?reason,
                "ignoring message"
            );
            return Outcome::Ignored(reason);
        }

        let (_processing, in_flight) = InFlight::enter(&self.in_flight);
        info!(
            author_id = msg.author_id,
            channel_id = msg.channel_id,
            in_flight,
            "answering question"
        );

        let reply = match self.answer(&msg.content).await {
            Ok(answer) => Reply::answer(&self.settings.reply_title, &answer, msg),
            Err(e) => {
                error!(author_id = msg.author_id, error = %e, "failed to answer question");
                Reply::error()
            }
        };

        let answered = !reply.is_error();
        match sink.send(msg.channel_id, &reply).await {
            Ok(()) if answered => Outcome::Answered,
            Ok(()) => Outcome::ErrorReplied,
            Err(e) if answered => {
                error!(channel_id = msg.channel_id, error = %e, "failed to send answer");
                self.send_error_reply(msg.channel_id, sink).await
            }
            Err(e) => {
                error!(channel_id = msg.channel_id, error = %e, "failed to send error reply");
                Outcome::SendFailed
            }
        }
    }

    async fn send_error_reply(&self, channel_id: u64, sink: &dyn ReplySink) -> Outcome {
        match sink.send(channel_id, &Reply::error()).await {
            Ok(()) => Outcome::ErrorReplied,
            Err(e) => {
                error!(channel_id, error = %e, "failed to send error reply");
                Outcome::SendFailed
            }
        }
    }
}
