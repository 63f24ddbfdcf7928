use std::sync::Arc;

use assistant_bridge::actions::HandlerRegistry;
use assistant_bridge::config::AppConfig;
use assistant_bridge::platform::{ChatPlatform, MattermostClient};
use assistant_bridge::server;
use assistant_bridge::store::{IdentityStore, LibSqlBackend};

#[tokio::main]
async fn main() -> assistant_bridge::error::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Arc::new(AppConfig::from_env().map_err(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export MATTERMOST_URL=https://chat.example.com");
        eprintln!("  export MATTERMOST_TOKEN=...");
        eprintln!("  export MATTERMOST_COMMAND_TOKEN=...   # slash command token");
        e
    })?);

    eprintln!("🔗 Assistant Bridge v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mattermost: {}", config.mattermost.url);
    eprintln!("   Webhook: http://{}/webhook", config.server.bind_addr);
    eprintln!("   Commands: http://{}/command", config.server.bind_addr);

    // ── Identity store ──────────────────────────────────────────────────
    let store: Arc<dyn IdentityStore> = Arc::new(
        LibSqlBackend::new_local(&config.store.db_path)
            .await?
            .with_scan_limit(config.store.scan_limit),
    );
    eprintln!("   Database: {}", config.store.db_path.display());

    // ── Chat platform + handlers ────────────────────────────────────────
    let platform: Arc<dyn ChatPlatform> = Arc::new(MattermostClient::new(&config.mattermost)?);
    let registry = Arc::new(HandlerRegistry::with_builtins(platform));
    eprintln!("   Handlers: {}\n", registry.names().join(", "));

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = server::router(store, registry, config.admin.command_token.clone());
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr).await?;
    tracing::info!(addr = %config.server.bind_addr, "Webhook server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
