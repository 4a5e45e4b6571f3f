use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::Result;
use super::events::MessageEvent;
use super::registry::PoolRegistry;
use crate::transport::{
    ChatTransport, DeliveredMessage, OutboundMessage, TransportResult, Webhook,
};

/// Name under which per-channel delivery identities are provisioned.
pub const WEBHOOK_NAME: &str = "Crosslink";

/// Fans a message out to every other member channel of a pool, preserving
/// the author's displayed identity through per-channel webhooks.
///
/// Destinations are delivered independently: one failed channel never
/// aborts the others, and failures are logged rather than raised.
pub struct RelayEngine {
    registry: Arc<PoolRegistry>,
    transport: Arc<dyn ChatTransport>,
    /// Channel ID -> provisioned webhook, so repeated relays into the
    /// same channel reuse one identity instead of re-listing every time.
    webhooks: DashMap<String, Webhook>,
}

impl RelayEngine {
    pub fn new(registry: Arc<PoolRegistry>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            registry,
            transport,
            webhooks: DashMap::new(),
        }
    }

    /// Relay `message` to every other member channel of `pool_name`.
    ///
    /// Increments the origin community's counter exactly once when at
    /// least one destination received the copy; a pool with no other
    /// channels is a no-op that neither counts nor persists.
    pub async fn relay(&self, message: &MessageEvent, pool_name: &str) -> Result<()> {
        // Relayed copies come back through the event feed flagged as
        // bot-authored; skipping bots here is what breaks the loop.
        if message.author_is_bot {
            return Ok(());
        }

        let destinations: Vec<String> = self
            .registry
            .pool_channels(pool_name)
            .await
            .into_iter()
            .filter(|(_, channel)| channel != &message.channel_id)
            .map(|(_, channel)| channel)
            .collect();
        if destinations.is_empty() {
            return Ok(());
        }

        let relay_id = Uuid::new_v4();
        let outbound = self.build_outbound(message).await;

        let results = join_all(
            destinations
                .iter()
                .map(|dest| self.deliver(dest, &outbound, &message.reactions)),
        )
        .await;

        let mut delivered = 0usize;
        for (dest, result) in destinations.iter().zip(results.iter()) {
            match result {
                Ok(_) => delivered += 1,
                Err(e) => {
                    warn!(%relay_id, pool = pool_name, channel = %dest, error = %e, "delivery failed")
                }
            }
        }
        if delivered == 0 {
            return Ok(());
        }

        info!(
            %relay_id,
            pool = pool_name,
            origin = %message.channel_id,
            delivered,
            destinations = destinations.len(),
            "message relayed"
        );
        self.registry.record_relay(pool_name, &message.guild_id).await
    }

    /// Assemble the outbound copy: composited identity plus downloaded
    /// attachments. An attachment that cannot be fetched is dropped from
    /// the relay instead of blocking it.
    async fn build_outbound(&self, message: &MessageEvent) -> OutboundMessage {
        let mut files = Vec::with_capacity(message.attachments.len());
        for attachment in &message.attachments {
            match self.transport.fetch_attachment(attachment).await {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!(url = %attachment.url, error = %e, "skipping attachment")
                }
            }
        }

        OutboundMessage {
            content: message.content.clone(),
            display_name: format!("{} · {}", message.author_display_name, message.guild_name),
            avatar_url: message.author_avatar_url.clone(),
            files,
        }
    }

    /// Deliver one copy into one destination channel and mirror the
    /// reactions already on the source message. Individual reaction
    /// failures are tolerated (the emoji may not exist there).
    async fn deliver(
        &self,
        channel_id: &str,
        outbound: &OutboundMessage,
        reactions: &[String],
    ) -> TransportResult<DeliveredMessage> {
        let webhook = self.webhook_for(channel_id).await?;
        let delivered = self.transport.send(&webhook, outbound).await?;

        for emoji in reactions {
            if let Err(e) = self
                .transport
                .add_reaction(channel_id, &delivered.id, emoji)
                .await
            {
                debug!(channel = %channel_id, %emoji, error = %e, "could not mirror reaction");
            }
        }

        Ok(delivered)
    }

    /// Find or lazily provision the delivery identity for a channel.
    /// Lookup is by name, so repeated relays never pile up duplicate
    /// identities on one channel.
    async fn webhook_for(&self, channel_id: &str) -> TransportResult<Webhook> {
        if let Some(hook) = self.webhooks.get(channel_id) {
            return Ok(hook.clone());
        }

        let existing = self
            .transport
            .list_webhooks(channel_id)
            .await?
            .into_iter()
            .find(|w| w.name == WEBHOOK_NAME);
        let hook = match existing {
            Some(hook) => hook,
            None => self.transport.create_webhook(channel_id, WEBHOOK_NAME).await?,
        };

        self.webhooks.insert(channel_id.to_string(), hook.clone());
        Ok(hook)
    }
}
