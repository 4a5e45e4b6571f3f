use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-community membership record within a pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Member channel IDs in join order. A channel appears at most once.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Messages relayed out of this community within this pool.
    #[serde(default)]
    pub message_count: u64,
}

/// A named set of channels, across communities, that mirror each other's
/// messages and reactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pool {
    /// Three states: `None` (never set), a non-empty secret required to
    /// join, or `Some("")` once the password has been removed.
    #[serde(default)]
    pub password: Option<String>,
    /// Community ID -> membership record.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
}

impl Pool {
    /// Whether joining this pool currently requires a password.
    pub fn requires_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Whether any community in this pool lists the channel.
    pub fn contains_channel(&self, channel_id: &str) -> bool {
        self.servers
            .values()
            .any(|entry| entry.channels.iter().any(|c| c == channel_id))
    }

    /// All `(community id, channel id)` pairs in the pool.
    pub fn channels(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.servers.iter().flat_map(|(guild_id, entry)| {
            entry
                .channels
                .iter()
                .map(move |c| (guild_id.as_str(), c.as_str()))
        })
    }
}
