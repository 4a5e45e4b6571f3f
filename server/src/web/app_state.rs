use std::sync::Arc;

use crate::engine::admin::AdminGate;
use crate::engine::reactions::ReactionSynchronizer;
use crate::engine::registry::PoolRegistry;
use crate::engine::relay::RelayEngine;

/// Shared state injected into all web handlers.
pub struct AppState {
    pub registry: Arc<PoolRegistry>,
    pub relay: Arc<RelayEngine>,
    pub reactions: Arc<ReactionSynchronizer>,
    pub admin: AdminGate,
    /// Shared secret expected on every inbound platform push.
    pub gateway_secret: String,
}
