//! Discord gateway adapter.
//!
//! Maps serenity `message` events onto [`InboundMessage`] and sends
//! [`Reply`]s back as embeds. All gateway protocol work is left to
//! serenity; serenity dispatches every event on its own task, which is the
//! per-message concurrency model the relay expects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    ChannelId, Client, Context, CreateEmbed, CreateEmbedFooter, CreateMessage, EventHandler,
    GatewayIntents, Message, Ready, Timestamp,
};
use serenity::http::Http;
use std::sync::Arc;
use tracing::info;

use faq_relay_core::RelayError;

use crate::listener::{InboundMessage, Relay, Reply, ReplySink};

/// Intents needed to read message text in guild channels.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

/// Convert a serenity message into the relay's inbound shape.
///
/// The display name follows the platform's precedence: guild nickname,
/// then global display name, then username.
pub fn to_inbound(msg: &Message) -> InboundMessage {
    let display_name = msg
        .member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .unwrap_or_else(|| msg.author.display_name().to_string());

    InboundMessage {
        author_id: msg.author.id.get(),
        author_display_name: display_name,
        channel_id: msg.channel_id.get(),
        content: msg.content.clone(),
        created_at: to_utc(&msg.timestamp),
        is_bot: msg.author.bot,
    }
}

/// Convert a gateway timestamp, keeping sub-second precision.
fn to_utc(ts: &Timestamp) -> DateTime<Utc> {
    ts.to_string()
        .parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| DateTime::<Utc>::from_timestamp(ts.unix_timestamp(), 0))
        .unwrap_or_else(Utc::now)
}

fn to_timestamp(t: &DateTime<Utc>) -> Option<Timestamp> {
    Timestamp::parse(&t.to_rfc3339()).ok()
}

/// Build the embed for a reply.
pub fn to_embed(reply: &Reply) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&reply.title)
        .description(&reply.description)
        .colour(reply.color);
    if let Some(footer) = &reply.footer_text {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(ts) = reply.timestamp.as_ref().and_then(to_timestamp) {
        embed = embed.timestamp(ts);
    }
    embed
}

/// Sends replies through the Discord REST API.
pub struct DiscordSink {
    http: Arc<Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReplySink for DiscordSink {
    async fn send(&self, channel_id: u64, reply: &Reply) -> Result<(), RelayError> {
        ChannelId::new(channel_id)
            .send_message(self.http.as_ref(), CreateMessage::new().embed(to_embed(reply)))
            .await
            .map(|_| ())
            .map_err(RelayError::outbound)
    }
}

struct Handler {
    relay: Arc<Relay>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let inbound = to_inbound(&msg);
        let sink = DiscordSink::new(Arc::clone(&ctx.http));
        self.relay.handle(&inbound, &sink).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            target_channel_id = self.relay.settings().target_channel_id,
            "connected to gateway"
        );
    }
}

/// Connect to the gateway and serve messages until the client stops.
pub async fn run(relay: Arc<Relay>, token: &str) -> Result<(), serenity::Error> {
    let mut client = Client::builder(token, intents())
        .event_handler(Handler { relay })
        .await?;
    client.start().await
}
