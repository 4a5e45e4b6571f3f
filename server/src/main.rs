use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crosslink_server::config::RelayConfig;
use crosslink_server::db::pool::{create_pool, run_migrations};
use crosslink_server::engine::admin::AdminGate;
use crosslink_server::engine::reactions::ReactionSynchronizer;
use crosslink_server::engine::registry::PoolRegistry;
use crosslink_server::engine::relay::RelayEngine;
use crosslink_server::transport::ChatTransport;
use crosslink_server::transport::http::HttpTransport;
use crosslink_server::web::app_state::AppState;
use crosslink_server::web::router::build_router;

#[derive(Parser)]
#[command(name = "crosslink-server", about = "Cross-community channel relay service")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "crosslink.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RelayConfig::load(&cli.config);

    let db = create_pool(&config.database.url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&db)
        .await
        .context("failed to run database migrations")?;

    // An unreachable or corrupt registry store is fatal at startup.
    let registry = Arc::new(
        PoolRegistry::load(db)
            .await
            .context("failed to load pool registry")?,
    );

    let transport: Arc<dyn ChatTransport> = Arc::new(
        HttpTransport::new(
            &config.platform.base_url,
            &config.platform.token,
            Duration::from_secs(config.platform.request_timeout_secs),
        )
        .context("failed to build platform client")?,
    );

    let relay = Arc::new(RelayEngine::new(registry.clone(), transport.clone()));
    let reactions = Arc::new(ReactionSynchronizer::new(
        registry.clone(),
        transport,
        config.platform.bot_user_id.clone(),
    ));
    let admin = AdminGate::new(config.admin.admin_users.iter().cloned());

    let state = Arc::new(AppState {
        registry,
        relay,
        reactions,
        admin,
        gateway_secret: config.server.gateway_secret.clone(),
    });
    let app = build_router(state);

    info!(address = %config.server.bind_address, "crosslink server starting");

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
