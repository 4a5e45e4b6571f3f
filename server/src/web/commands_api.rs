use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::app_state::AppState;
use super::auth_middleware::GatewayAuth;
use crate::engine::analytics;
use crate::engine::error::{RelayError, Result};

/// A slash-command invocation forwarded by the platform.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub user_id: String,
    pub guild_id: String,
    /// Channel the command was invoked in; the default target channel.
    pub channel_id: String,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    AddToPool {
        pool_name: String,
        #[serde(default)]
        channel: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    RemoveFromPool {
        pool_name: String,
        #[serde(default)]
        channel: Option<String>,
    },
    SetPassword {
        pool_name: String,
        password: String,
    },
    RemovePassword {
        pool_name: String,
    },
    ListPools,
    PoolAnalytics,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub message: String,
}

/// POST /api/commands: the administrator command surface.
pub async fn execute_command(
    _auth: GatewayAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommandRequest>,
) -> Response {
    match run_command(&state, &request).await {
        Ok(message) => (StatusCode::OK, Json(CommandResponse { message })).into_response(),
        Err(err) => (
            status_for(&err),
            Json(CommandResponse {
                message: err.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn run_command(state: &AppState, request: &CommandRequest) -> Result<String> {
    // Authorization comes first; unprivileged callers never reach the
    // registry.
    state.admin.ensure(&request.user_id)?;

    match &request.command {
        Command::AddToPool {
            pool_name,
            channel,
            password,
        } => {
            let channel = channel.as_deref().unwrap_or(&request.channel_id);
            let outcome = state
                .registry
                .add_channel(pool_name, &request.guild_id, channel, password.as_deref())
                .await?;
            Ok(if outcome.already_member {
                format!("Channel {channel} is already in the `{pool_name}` pool.")
            } else if outcome.created_pool {
                format!("Pool `{pool_name}` created. Channel {channel} added.")
            } else {
                format!("Channel {channel} added to the `{pool_name}` pool.")
            })
        }
        Command::RemoveFromPool { pool_name, channel } => {
            let channel = channel.as_deref().unwrap_or(&request.channel_id);
            state
                .registry
                .remove_channel(pool_name, &request.guild_id, channel)
                .await?;
            Ok(format!(
                "Channel {channel} removed from the `{pool_name}` pool."
            ))
        }
        Command::SetPassword {
            pool_name,
            password,
        } => {
            state.registry.set_password(pool_name, password).await?;
            Ok(format!("Password set for pool `{pool_name}`."))
        }
        Command::RemovePassword { pool_name } => {
            state.registry.clear_password(pool_name).await?;
            Ok(format!("Password removed for pool `{pool_name}`."))
        }
        Command::ListPools => {
            let snapshot = state.registry.snapshot().await;
            let rows = analytics::membership_rows(&snapshot);
            if rows.is_empty() {
                Ok("No relay pools found.".into())
            } else {
                Ok(format!(
                    "```\n{}```",
                    analytics::render_table(["Pool", "Server", "Channel"], &rows)
                ))
            }
        }
        Command::PoolAnalytics => {
            let snapshot = state.registry.snapshot().await;
            let rows = analytics::analytics_rows(&snapshot);
            if rows.is_empty() {
                Ok("No analytics available.".into())
            } else {
                Ok(format!(
                    "```\n{}```",
                    analytics::render_table(["Pool", "Server", "Message Count"], &rows)
                ))
            }
        }
    }
}

fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::AuthorizationDenied => StatusCode::FORBIDDEN,
        RelayError::PoolNotFound(_) | RelayError::ChannelNotInPool { .. } => StatusCode::NOT_FOUND,
        RelayError::PasswordRequired(_)
        | RelayError::PasswordMismatch(_)
        | RelayError::NoPasswordSet(_) => StatusCode::BAD_REQUEST,
        RelayError::Persistence(_) | RelayError::PersistenceCorrupt(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_request_deserializes_flattened_tag() {
        let raw = r#"{
            "user_id": "u1",
            "guild_id": "g1",
            "channel_id": "c1",
            "command": "add_to_pool",
            "pool_name": "general",
            "password": "pw"
        }"#;
        let request: CommandRequest = serde_json::from_str(raw).unwrap();
        match request.command {
            Command::AddToPool {
                pool_name,
                channel,
                password,
            } => {
                assert_eq!(pool_name, "general");
                assert!(channel.is_none());
                assert_eq!(password.as_deref(), Some("pw"));
            }
            other => panic!("expected AddToPool, got {other:?}"),
        }
    }

    #[test]
    fn test_inspection_commands_have_no_extra_fields() {
        let raw = r#"{
            "user_id": "u1",
            "guild_id": "g1",
            "channel_id": "c1",
            "command": "list_pools"
        }"#;
        let request: CommandRequest = serde_json::from_str(raw).unwrap();
        assert!(matches!(request.command, Command::ListPools));
    }

    #[test]
    fn test_validation_errors_map_to_client_statuses() {
        assert_eq!(
            status_for(&RelayError::AuthorizationDenied),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&RelayError::PoolNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&RelayError::PasswordRequired("x".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
