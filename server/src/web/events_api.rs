use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::error;

use super::app_state::AppState;
use super::auth_middleware::GatewayAuth;
use crate::engine::events::{GatewayEvent, MessageEvent, ReactionEvent};

/// POST /api/events: the inbound platform push feed.
///
/// Processing is fire-and-forget: the event is acknowledged immediately
/// and relayed in a spawned task, so a slow destination never backs up
/// the feed. Errors are logged per pool, not returned to the platform.
pub async fn receive_event(
    _auth: GatewayAuth,
    State(state): State<Arc<AppState>>,
    Json(event): Json<GatewayEvent>,
) -> StatusCode {
    match event {
        GatewayEvent::MessageCreated(message) => {
            tokio::spawn(dispatch_message(state, message));
        }
        GatewayEvent::ReactionAdded(reaction) => {
            tokio::spawn(dispatch_reaction(state, reaction));
        }
    }
    StatusCode::ACCEPTED
}

/// Relay a message into every pool its origin channel belongs to.
/// Pools are independent: a failure in one does not stop the others.
pub(crate) async fn dispatch_message(state: Arc<AppState>, message: MessageEvent) {
    let pools = state.registry.pools_containing(&message.channel_id).await;
    for pool in pools {
        if let Err(e) = state.relay.relay(&message, &pool).await {
            error!(pool = %pool, channel = %message.channel_id, error = %e, "relay failed");
        }
    }
}

/// Mirror a reaction into every pool its channel belongs to.
pub(crate) async fn dispatch_reaction(state: Arc<AppState>, reaction: ReactionEvent) {
    let pools = state.registry.pools_containing(&reaction.channel_id).await;
    for pool in pools {
        state.reactions.sync_reaction(&pool, &reaction).await;
    }
}
