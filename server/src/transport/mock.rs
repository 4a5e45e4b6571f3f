//! In-memory chat platform for tests. Channels hold messages newest-first;
//! delivery failures can be scripted per channel.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{
    ChatTransport, DeliveredMessage, FilePayload, HistoryEntry, OutboundMessage, TransportError,
    TransportResult, Webhook,
};
use crate::engine::events::AttachmentRef;

#[derive(Debug, Clone)]
pub struct MockMessage {
    pub id: String,
    pub content: String,
    pub display_name: String,
    pub reactions: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Default)]
pub struct MockTransport {
    webhooks: DashMap<String, Vec<Webhook>>,
    channels: DashMap<String, Vec<MockMessage>>,
    failing: DashMap<String, ()>,
    next_id: AtomicU64,
    webhooks_created: AtomicU64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn ensure_up(&self, channel_id: &str, what: &str) -> TransportResult<()> {
        if self.failing.contains_key(channel_id) {
            Err(TransportError::Delivery(format!(
                "channel {channel_id} unavailable during {what}"
            )))
        } else {
            Ok(())
        }
    }

    /// Make every call touching `channel_id` fail from now on.
    pub fn fail_channel(&self, channel_id: &str) {
        self.failing.insert(channel_id.to_string(), ());
    }

    /// Place a message directly into a channel (as if a user posted it).
    /// Returns the message id.
    pub fn seed_message(&self, channel_id: &str, content: &str) -> String {
        let msg = MockMessage {
            id: self.id("m"),
            content: content.to_string(),
            display_name: String::new(),
            reactions: Vec::new(),
            files: Vec::new(),
        };
        let id = msg.id.clone();
        self.channels
            .entry(channel_id.to_string())
            .or_default()
            .insert(0, msg);
        id
    }

    /// Messages currently in a channel, newest first.
    pub fn messages(&self, channel_id: &str) -> Vec<MockMessage> {
        self.channels
            .get(channel_id)
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn webhook_count(&self, channel_id: &str) -> usize {
        self.webhooks.get(channel_id).map(|w| w.len()).unwrap_or(0)
    }

    pub fn total_webhooks_created(&self) -> u64 {
        self.webhooks_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn list_webhooks(&self, channel_id: &str) -> TransportResult<Vec<Webhook>> {
        self.ensure_up(channel_id, "list webhooks")?;
        Ok(self
            .webhooks
            .get(channel_id)
            .map(|w| w.clone())
            .unwrap_or_default())
    }

    async fn create_webhook(&self, channel_id: &str, name: &str) -> TransportResult<Webhook> {
        self.ensure_up(channel_id, "create webhook")?;
        self.webhooks_created.fetch_add(1, Ordering::SeqCst);
        let webhook = Webhook {
            id: self.id("wh"),
            token: self.id("tok"),
            channel_id: channel_id.to_string(),
            name: name.to_string(),
        };
        self.webhooks
            .entry(channel_id.to_string())
            .or_default()
            .push(webhook.clone());
        Ok(webhook)
    }

    async fn send(
        &self,
        webhook: &Webhook,
        message: &OutboundMessage,
    ) -> TransportResult<DeliveredMessage> {
        self.ensure_up(&webhook.channel_id, "send")?;
        let msg = MockMessage {
            id: self.id("m"),
            content: message.content.clone(),
            display_name: message.display_name.clone(),
            reactions: Vec::new(),
            files: message.files.iter().map(|f| f.filename.clone()).collect(),
        };
        let delivered = DeliveredMessage {
            id: msg.id.clone(),
            channel_id: webhook.channel_id.clone(),
        };
        self.channels
            .entry(webhook.channel_id.clone())
            .or_default()
            .insert(0, msg);
        Ok(delivered)
    }

    async fn fetch_recent_history(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> TransportResult<Vec<HistoryEntry>> {
        self.ensure_up(channel_id, "fetch history")?;
        Ok(self
            .channels
            .get(channel_id)
            .map(|msgs| {
                msgs.iter()
                    .take(limit as usize)
                    .map(|m| HistoryEntry {
                        id: m.id.clone(),
                        content: m.content.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()> {
        self.ensure_up(channel_id, "add reaction")?;
        let mut channel = self
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| TransportError::Delivery(format!("no such channel {channel_id}")))?;
        let msg = channel
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| TransportError::Delivery(format!("no such message {message_id}")))?;
        // Deliberately no dedup: double-adds must be visible to tests.
        msg.reactions.push(emoji.to_string());
        Ok(())
    }

    async fn list_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> TransportResult<Vec<String>> {
        self.ensure_up(channel_id, "list reactions")?;
        let channel = self
            .channels
            .get(channel_id)
            .ok_or_else(|| TransportError::Delivery(format!("no such channel {channel_id}")))?;
        let msg = channel
            .iter()
            .find(|m| m.id == message_id)
            .ok_or_else(|| TransportError::Delivery(format!("no such message {message_id}")))?;
        Ok(msg.reactions.clone())
    }

    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> TransportResult<FilePayload> {
        Ok(FilePayload {
            filename: attachment.filename.clone(),
            bytes: attachment.url.as_bytes().to_vec(),
        })
    }
}
