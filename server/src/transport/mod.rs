//! Chat-platform boundary. The relay engine only talks to the platform
//! through [`ChatTransport`]; the HTTP implementation lives in [`http`]
//! and tests substitute an in-memory double.

pub mod http;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::events::AttachmentRef;

pub type TransportResult<T> = Result<T, TransportError>;

/// Per-destination delivery failure. Non-fatal: the fan-out isolates and
/// logs these instead of raising them.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("platform request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform returned {status} for {context}")]
    Status { status: u16, context: String },

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A named per-channel delivery identity. Messages sent through it display
/// a caller-chosen name and avatar instead of the service's own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub token: String,
    pub channel_id: String,
    pub name: String,
}

/// A downloaded attachment ready to be re-sent.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Identity and content for one webhook delivery.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub content: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub files: Vec<FilePayload>,
}

/// A message created by a webhook send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredMessage {
    pub id: String,
    pub channel_id: String,
}

/// A message as returned from a channel history scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub content: String,
}

/// Operations the relay engine needs from the chat platform.
///
/// All calls are expected to complete within a bounded timeout; a timeout
/// is treated as an ordinary delivery failure by callers.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// List the named delivery identities installed on a channel.
    async fn list_webhooks(&self, channel_id: &str) -> TransportResult<Vec<Webhook>>;

    /// Provision a new named delivery identity on a channel.
    async fn create_webhook(&self, channel_id: &str, name: &str) -> TransportResult<Webhook>;

    /// Send a message through a delivery identity.
    async fn send(
        &self,
        webhook: &Webhook,
        message: &OutboundMessage,
    ) -> TransportResult<DeliveredMessage>;

    /// Fetch up to `limit` messages from a channel, most recent first.
    async fn fetch_recent_history(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> TransportResult<Vec<HistoryEntry>>;

    /// Add a reaction to a message.
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()>;

    /// List the emoji currently reacted onto a message.
    async fn list_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> TransportResult<Vec<String>>;

    /// Download an attachment into a transferable payload.
    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> TransportResult<FilePayload>;
}
