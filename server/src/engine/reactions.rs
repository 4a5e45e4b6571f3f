use std::sync::Arc;

use tracing::{debug, warn};

use super::events::ReactionEvent;
use super::registry::PoolRegistry;
use crate::transport::{ChatTransport, TransportResult};

/// How many recent messages are scanned when correlating relayed copies.
pub const HISTORY_WINDOW: u32 = 20;

/// Mirrors a reaction onto already-relayed copies of a message in the
/// pool's sibling channels.
///
/// There is no persisted cross-channel message-id mapping: a copy is
/// correlated by exact content equality within the recent-history window.
/// Duplicate content inside that window is inherently ambiguous; the
/// first match wins.
pub struct ReactionSynchronizer {
    registry: Arc<PoolRegistry>,
    transport: Arc<dyn ChatTransport>,
    /// The service's own platform user id; its reactions are not mirrored
    /// back, which would otherwise loop.
    self_user_id: String,
}

impl ReactionSynchronizer {
    pub fn new(
        registry: Arc<PoolRegistry>,
        transport: Arc<dyn ChatTransport>,
        self_user_id: String,
    ) -> Self {
        Self {
            registry,
            transport,
            self_user_id,
        }
    }

    /// Replicate `event`'s reaction into every other channel of the pool.
    /// Failures are isolated per destination and logged, never raised.
    pub async fn sync_reaction(&self, pool_name: &str, event: &ReactionEvent) {
        if event.user_id == self.self_user_id {
            return;
        }

        let destinations: Vec<String> = self
            .registry
            .pool_channels(pool_name)
            .await
            .into_iter()
            .filter(|(_, channel)| channel != &event.channel_id)
            .map(|(_, channel)| channel)
            .collect();

        for destination in &destinations {
            if let Err(e) = self.mirror_into(destination, event).await {
                warn!(
                    pool = pool_name,
                    channel = %destination,
                    emoji = %event.emoji,
                    error = %e,
                    "reaction mirror failed"
                );
            }
        }
    }

    /// Find the first content-equal message in the channel's recent
    /// history and add the reaction unless it is already present.
    async fn mirror_into(&self, channel_id: &str, event: &ReactionEvent) -> TransportResult<()> {
        let history = self
            .transport
            .fetch_recent_history(channel_id, HISTORY_WINDOW)
            .await?;

        let Some(matched) = history.iter().find(|m| m.content == event.message_content) else {
            debug!(channel = %channel_id, "no relayed copy found in history window");
            return Ok(());
        };

        let existing = self.transport.list_reactions(channel_id, &matched.id).await?;
        if existing.iter().any(|emoji| emoji == &event.emoji) {
            return Ok(());
        }

        self.transport
            .add_reaction(channel_id, &matched.id, &event.emoji)
            .await
    }
}
