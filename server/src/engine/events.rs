use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to an attachment on a platform message. The transport layer
/// downloads the bytes on demand when the message is relayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    pub url: String,
}

/// A message-created event pushed by the platform feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: String,
    pub guild_id: String,
    pub guild_name: String,
    pub channel_id: String,
    pub author_id: String,
    pub author_display_name: String,
    #[serde(default)]
    pub author_avatar_url: Option<String>,
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    /// Emoji already present on the message when the event fired.
    #[serde(default)]
    pub reactions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// A reaction-added event pushed by the platform feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
    /// Content of the reacted-to message, used to correlate relayed copies
    /// in sibling channels.
    pub message_content: String,
}

/// Envelope for the inbound platform push feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    MessageCreated(MessageEvent),
    ReactionAdded(ReactionEvent),
}
