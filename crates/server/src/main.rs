use std::sync::Arc;

use polls::{AppState, app, config::Config, notify::LogNotifier, setup_log, store::PgStore};
use tokio::{net::TcpListener, signal};
use tracing::info;

// ===== Main =====

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_log();
    let config = Config::from_env()?;

    // Setup database connection
    let store = PgStore::connect(&config.database_url, config.max_connections).await?;
    store.migrate().await?;

    let state = AppState::new(Arc::new(store), Arc::new(LogNotifier));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
