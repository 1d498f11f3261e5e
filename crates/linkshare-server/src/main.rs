//! linkshare-server: the LinkShare HTTP service.
//!
//! Single process on a Tokio runtime serving the JSON API under `/api`.

use std::sync::Arc;

use linkshare_accounts::LogNotifier;
use linkshare_server::{api, AppState, ServerConfig};
use linkshare_types::SystemClock;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = ServerConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("linkshare={}", config.logging.level).parse()?),
        )
        .init();

    info!("LinkShare server starting");

    // Ensure data directory exists
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Open database
    let conn = linkshare_db::open(&db_path)?;
    info!("Database opened at {:?}", db_path);

    // 3. Build shared state
    let notifier = Arc::new(LogNotifier::new(config.mail.default_sender.clone()));
    let state = Arc::new(AppState::new(conn, config, notifier, Arc::new(SystemClock)));

    {
        let db = state.db.lock().await;
        state.accounts(&db).purge_expired_reset_tokens()?;
    }

    // 4. Serve until Ctrl-C
    let listener = tokio::net::TcpListener::bind(&state.config.server.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, api::router(state.clone()))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, shutting down");
            }
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
