//! Database connection pool and migrations.

use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::settings::DatabaseSettings;

/// Open a connection pool to `url`.
pub async fn connect(settings: &DatabaseSettings, url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(url)
        .await?;
    info!(max_connections = settings.max_connections, "connected to database");
    Ok(pool)
}

/// Apply the migrations bundled from `migrations/`.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
