pub mod app_state;
pub mod auth_middleware;
pub mod commands_api;
pub mod events_api;
pub mod router;
