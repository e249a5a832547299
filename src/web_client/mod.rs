//! feedline-web: HTTP surface over the feed core.
//!
//! Each viewer gets a server-side session holding its displayed feed and
//! like toggles; state is persisted in SQLite.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;

use crate::lookup::LookupPolicy;
use crate::storage::{db_path, Storage};
use crate::store::SqliteStore;

use config::{Cli, Config};
use state::{AppState, SharedState};

/// Entry point: parse configuration, open the database, serve.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_cli_and_env(Cli::parse());

    crate::logging::init();
    crate::tlog!("feedline-web starting");
    crate::tlog!("  data directory: {}", config.data_dir.display());

    let path = db_path(&config.data_dir);
    let storage = Storage::open(&path)?;
    crate::tlog!("  database: {}", path.display());
    crate::tlog!(
        "  lookup timeout: {} ms",
        config.lookup_timeout.as_millis()
    );

    let state: SharedState = Arc::new(AppState::new(
        SqliteStore::new(storage),
        LookupPolicy::with_timeout(config.lookup_timeout),
    ));
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    crate::tlog!("feedline-web listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    crate::tlog!("feedline-web stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            crate::tlog!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                crate::tlog!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => crate::tlog!("received Ctrl+C, shutting down"),
        _ = terminate => crate::tlog!("received terminate signal, shutting down"),
    }
}
