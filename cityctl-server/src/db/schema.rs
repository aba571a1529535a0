//! Schema management for the `poi` table

use sqlx::PgPool;

use super::DbError;

/// Table holding every city record
pub const TABLE_NAME: &str = "poi";

/// Spatial reference of the `geom` column
pub const SRID: i32 = 4326;

/// Create the table and spatial index if they don't exist.
///
/// Strict: the first failing statement is returned.
pub async fn create_schema(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS postgis")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS poi (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(128) NOT NULL,
            description VARCHAR(1024),
            population INTEGER,
            geom geometry(Point, 4326)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS sidx_poi_geom ON poi USING gist (geom)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Lenient startup variant of [`create_schema`].
///
/// Failures are logged, never raised; queries will fail per request instead.
/// Returns whether the schema was verified.
pub async fn ensure_schema(pool: &PgPool) -> bool {
    match create_schema(pool).await {
        Ok(()) => {
            tracing::info!(table = TABLE_NAME, "Table {} ready", TABLE_NAME);
            true
        }
        Err(e) => {
            tracing::error!(table = TABLE_NAME, error = %e, "Schema creation failed");
            false
        }
    }
}
