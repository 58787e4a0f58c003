//! Persistence: the `Store` contract and its Postgres and in-memory backends.

pub mod memory;
pub mod postgres;
pub mod store;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::Store;

/// Opens the configured store: Postgres with migrations applied, or the
/// in-memory store when no database is configured.
pub async fn open_store(database: Option<&DatabaseConfig>) -> AppResult<Arc<dyn Store>> {
    let Some(database) = database else {
        log::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = create_pool(database).await?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Internal(format!("migration failed: {}", e)))?;
    Ok(Arc::new(PgStore::new(pool)))
}

/// Connection pool whose sessions compare observation windows in UTC
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("SET timezone = 'UTC'").execute(conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    log::info!(
        "Postgres store connected (pool {}..{})",
        config.min_connections,
        config.max_connections
    );
    Ok(pool)
}

/// Applies the groups/services/hits/failures schema
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Store schema is up to date");
    Ok(())
}
