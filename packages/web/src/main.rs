//! LunaTODO server entry point.
//!
//! With `database.url` (or `DATABASE_URL`) set, users, todos and sessions live in
//! PostgreSQL and migrations run at start-up. Without it everything is kept in memory
//! and lost on exit.

use anyhow::Context;
use api::db::{self, MemoryDatastore, PgDatastore};
use api::{router, AppState, Settings};
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,api=debug,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let settings = Settings::load().context("Failed to load settings")?;
    let address = settings.address();

    let app = match settings.database.url.clone() {
        Some(url) => {
            let pool = db::connect(&settings.database, &url)
                .await
                .context("Failed to connect to database")?;
            db::migrate(&pool)
                .await
                .context("Failed to run migrations")?;

            let session_store = PostgresStore::new(pool.clone());
            session_store
                .migrate()
                .await
                .context("Failed to create session table")?;

            router(AppState::new(PgDatastore::new(pool), settings), session_store)
        }
        None => {
            warn!("no database configured, data will not survive a restart");
            router(
                AppState::new(MemoryDatastore::new(), settings),
                MemoryStore::default(),
            )
        }
    };

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
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
