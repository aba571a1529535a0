//! Database connection pool management
//!
//! Uses sqlx PgPool with an explicit connection limit. The pool connects
//! eagerly, so a bad configuration fails at startup rather than on the
//! first request.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::config::DbConfig;

/// Create a PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the options are invalid or the first connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DbConfig::from_env()).await?;
/// ```
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let options = config.connect_options()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    tracing::info!(
        database = %config.describe(),
        max_connections = config.max_connections,
        "Connected to database"
    );

    Ok(pool)
}
