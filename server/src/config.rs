use std::path::Path;

use serde::Deserialize;
use tracing::info;

/// Top-level service configuration, loaded from crosslink.toml.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub platform: PlatformSection,
    pub admin: AdminSection,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_address: String,
    /// Shared secret the platform attaches (as a bearer token) to event
    /// and command pushes.
    pub gateway_secret: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8090".into(),
            gateway_secret: "crosslink-dev-secret-change-me".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite:crosslink.db?mode=rwc".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct PlatformSection {
    /// Base URL of the chat platform's REST API.
    pub base_url: String,
    /// Bot token used to authenticate outbound platform calls.
    pub token: String,
    /// The service's own platform user id, so its reactions are never
    /// mirrored back.
    pub bot_user_id: String,
    /// Upper bound on any single platform call.
    pub request_timeout_secs: u64,
}

impl Default for PlatformSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            token: String::new(),
            bot_user_id: String::new(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct AdminSection {
    /// User ids allowed to run pool administration commands.
    pub admin_users: Vec<String>,
}

impl RelayConfig {
    /// Load config from a TOML file. Falls back to defaults if the file
    /// doesn't exist. Environment variables override TOML values.
    pub fn load(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path, e));
            toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path, e))
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_SECRET") {
            self.server.gateway_secret = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("PLATFORM_BASE_URL") {
            self.platform.base_url = v;
        }
        if let Ok(v) = std::env::var("PLATFORM_TOKEN") {
            self.platform.token = v;
        }
        if let Ok(v) = std::env::var("BOT_USER_ID") {
            self.platform.bot_user_id = v;
        }
        if let Ok(v) = std::env::var("PLATFORM_TIMEOUT_SECS")
            && let Ok(secs) = v.parse()
        {
            self.platform.request_timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("ADMIN_USERS") {
            self.admin.admin_users = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
}
