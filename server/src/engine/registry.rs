use std::collections::{BTreeMap, BTreeSet};

use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::error::{RelayError, Result};
use super::pool::Pool;
use crate::db::registry_store;

/// Result of [`PoolRegistry::add_channel`], used by the command surface
/// to word its confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub created_pool: bool,
    pub already_member: bool,
}

/// Authoritative pool/membership state.
///
/// Loaded once at startup; the in-memory copy is the source of truth
/// between persists. Every mutation runs under the write lock through
/// "validate -> mutate -> persist", so concurrent admin commands cannot
/// lose updates, and the full document is written back after each change.
/// Reads take the read lock and observe a consistent snapshot.
#[derive(Debug)]
pub struct PoolRegistry {
    pools: RwLock<BTreeMap<String, Pool>>,
    db: SqlitePool,
}

impl PoolRegistry {
    /// Fetch the singleton document, initializing an empty registry on
    /// first run. An unreachable store is fatal to startup; a document
    /// that no longer parses is rejected rather than propagated.
    pub async fn load(db: SqlitePool) -> Result<Self> {
        let pools: BTreeMap<String, Pool> = match registry_store::get_document(&db).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => {
                let empty = BTreeMap::new();
                registry_store::put_document(&db, &serde_json::to_string(&empty)?).await?;
                empty
            }
        };

        info!(pools = pools.len(), "pool registry loaded");
        Ok(Self {
            pools: RwLock::new(pools),
            db,
        })
    }

    /// Write the registry back as one document. A failed write is retried
    /// once; if that also fails the caller sees the mutation as failed,
    /// even though memory already changed.
    async fn save(&self, pools: &BTreeMap<String, Pool>) -> Result<()> {
        let doc = serde_json::to_string(pools)?;
        if let Err(first) = registry_store::put_document(&self.db, &doc).await {
            warn!(error = %first, "registry persist failed, retrying");
            if let Err(second) = registry_store::put_document(&self.db, &doc).await {
                error!(error = %second, "registry persist failed after retry; store is behind memory");
                return Err(second.into());
            }
        }
        Ok(())
    }

    /// Create a pool if absent. An existing pool is returned unchanged;
    /// re-creation never overwrites its password.
    pub async fn create_or_get_pool(&self, name: &str, password: Option<&str>) -> Result<Pool> {
        let mut pools = self.pools.write().await;
        if let Some(existing) = pools.get(name) {
            return Ok(existing.clone());
        }
        let pool = Pool {
            password: password.map(str::to_string),
            servers: BTreeMap::new(),
        };
        pools.insert(name.to_string(), pool.clone());
        self.save(&pools).await?;
        Ok(pool)
    }

    /// Add a channel to a pool, creating the pool (and the community's
    /// entry) implicitly. A non-empty pool password must be matched
    /// exactly; re-adding a present channel is a no-op success.
    pub async fn add_channel(
        &self,
        pool_name: &str,
        guild_id: &str,
        channel_id: &str,
        password: Option<&str>,
    ) -> Result<AddOutcome> {
        let mut pools = self.pools.write().await;

        let created_pool = !pools.contains_key(pool_name);
        let pool = pools.entry(pool_name.to_string()).or_insert_with(|| Pool {
            password: password.map(str::to_string),
            servers: BTreeMap::new(),
        });

        if !created_pool && pool.requires_password() {
            match password {
                None => return Err(RelayError::PasswordRequired(pool_name.to_string())),
                Some(supplied) if Some(supplied) != pool.password.as_deref() => {
                    return Err(RelayError::PasswordMismatch(pool_name.to_string()));
                }
                Some(_) => {}
            }
        }

        let entry = pool.servers.entry(guild_id.to_string()).or_default();
        if entry.channels.iter().any(|c| c == channel_id) {
            return Ok(AddOutcome {
                created_pool,
                already_member: true,
            });
        }
        entry.channels.push(channel_id.to_string());

        self.save(&pools).await?;
        Ok(AddOutcome {
            created_pool,
            already_member: false,
        })
    }

    /// Remove a channel from a pool. When the channel is not listed there,
    /// the error names the pools that do contain it.
    pub async fn remove_channel(
        &self,
        pool_name: &str,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<()> {
        let mut pools = self.pools.write().await;

        let Some(pool) = pools.get(pool_name) else {
            return Err(RelayError::PoolNotFound(pool_name.to_string()));
        };
        let listed = pool
            .servers
            .get(guild_id)
            .is_some_and(|entry| entry.channels.iter().any(|c| c == channel_id));
        if !listed {
            return Err(RelayError::ChannelNotInPool {
                pool: pool_name.to_string(),
                channel: channel_id.to_string(),
                member_of: pools_with_channel(&pools, channel_id),
            });
        }

        if let Some(entry) = pools
            .get_mut(pool_name)
            .and_then(|p| p.servers.get_mut(guild_id))
        {
            entry.channels.retain(|c| c != channel_id);
        }
        // Emptied entries and pools stay in the registry; only explicit
        // removal mutates membership.

        self.save(&pools).await
    }

    /// Reverse lookup: names of every pool listing the channel.
    pub async fn pools_containing(&self, channel_id: &str) -> BTreeSet<String> {
        let pools = self.pools.read().await;
        pools
            .iter()
            .filter(|(_, pool)| pool.contains_channel(channel_id))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// All `(community id, channel id)` pairs of a pool, or empty if the
    /// pool does not exist.
    pub async fn pool_channels(&self, pool_name: &str) -> Vec<(String, String)> {
        let pools = self.pools.read().await;
        pools
            .get(pool_name)
            .map(|pool| {
                pool.channels()
                    .map(|(g, c)| (g.to_string(), c.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn set_password(&self, pool_name: &str, password: &str) -> Result<()> {
        let mut pools = self.pools.write().await;
        let Some(pool) = pools.get_mut(pool_name) else {
            return Err(RelayError::PoolNotFound(pool_name.to_string()));
        };
        pool.password = Some(password.to_string());
        self.save(&pools).await
    }

    /// Clear a pool's password. The cleared state is stored as an empty
    /// string, which no longer gates joins.
    pub async fn clear_password(&self, pool_name: &str) -> Result<()> {
        let mut pools = self.pools.write().await;
        let Some(pool) = pools.get_mut(pool_name) else {
            return Err(RelayError::PoolNotFound(pool_name.to_string()));
        };
        if !pool.requires_password() {
            return Err(RelayError::NoPasswordSet(pool_name.to_string()));
        }
        pool.password = Some(String::new());
        self.save(&pools).await
    }

    /// Count one relayed message against the origin community of a pool.
    /// Called once per successful relay batch, never per destination.
    pub async fn record_relay(&self, pool_name: &str, guild_id: &str) -> Result<()> {
        let mut pools = self.pools.write().await;
        match pools
            .get_mut(pool_name)
            .and_then(|p| p.servers.get_mut(guild_id))
        {
            Some(entry) => entry.message_count += 1,
            None => {
                // Membership changed while the relay was in flight.
                warn!(pool = pool_name, guild = guild_id, "relay origin no longer in pool");
                return Ok(());
            }
        }
        self.save(&pools).await
    }

    /// A consistent snapshot of all pools for read-only views.
    pub async fn snapshot(&self) -> BTreeMap<String, Pool> {
        self.pools.read().await.clone()
    }
}

fn pools_with_channel(pools: &BTreeMap<String, Pool>, channel_id: &str) -> Vec<String> {
    pools
        .iter()
        .filter(|(_, pool)| pool.contains_channel(channel_id))
        .map(|(name, _)| name.clone())
        .collect()
}
