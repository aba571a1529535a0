//! City repository
//!
//! Handles city CRUD against PostGIS:
//! - geometry goes in as GeoJSON text (`ST_GeomFromGeoJSON`), flattened
//!   to 2D since the column has no Z dimension
//! - geometry comes back as GeoJSON text (`ST_AsGeoJSON`)
//! - update: row lock + merge + overwrite in one transaction

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db::schema::SRID;
use crate::db::{CityStore, DbError};
use crate::models::{City, CityPatch, SpatialQuery, TextQuery};

const SELECT_COLUMNS: &str =
    "id, name, description, population, ST_AsGeoJSON(geom) AS geometry";

/// PostgreSQL-backed city store
#[derive(Debug, Clone)]
pub struct PgCityStore {
    pool: PgPool,
}

impl PgCityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Full overwrite used by both replace and update.
    async fn overwrite<'e, E>(executor: E, id: i64, city: &City) -> Result<u64, DbError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE poi
            SET name = $2,
                description = $3,
                population = $4,
                geom = ST_Force2D(ST_SetSRID(ST_GeomFromGeoJSON($5), $6))
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&city.name)
        .bind(&city.description)
        .bind(city.population)
        .bind(&city.geometry)
        .bind(SRID)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    async fn lock_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<City, DbError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM poi WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, City>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| DbError::not_found(id))
    }
}

#[async_trait]
impl CityStore for PgCityStore {
    async fn insert(&self, city: &City) -> Result<i64, DbError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO poi (name, description, population, geom)
            VALUES ($1, $2, $3, ST_Force2D(ST_SetSRID(ST_GeomFromGeoJSON($4), $5)))
            RETURNING id
            "#,
        )
        .bind(&city.name)
        .bind(&city.description)
        .bind(city.population)
        .bind(&city.geometry)
        .bind(SRID)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id, name = %city.name, "City inserted");
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<City, DbError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM poi WHERE id = $1");
        sqlx::query_as::<_, City>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(id))
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM poi WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(id, rows = result.rows_affected(), "City deleted");
        Ok(true)
    }

    async fn delete_all(&self) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM poi").execute(&self.pool).await?;

        tracing::info!(rows = result.rows_affected(), "All cities deleted");
        Ok(true)
    }

    async fn search_text(&self, query: &TextQuery) -> Result<Vec<City>, DbError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM poi \
             WHERE name LIKE $1 OR description LIKE $1 \
             LIMIT $2"
        );
        let cities = sqlx::query_as::<_, City>(&sql)
            .bind(like_pattern(&query.search))
            .bind(query.limit())
            .fetch_all(&self.pool)
            .await?;

        Ok(cities)
    }

    async fn search_spatial(&self, query: &SpatialQuery) -> Result<Vec<City>, DbError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM poi \
             WHERE geom && ST_MakeEnvelope($2, $3, $4, $5, $6) \
             AND (name LIKE $1 OR description LIKE $1) \
             LIMIT $7"
        );
        let cities = sqlx::query_as::<_, City>(&sql)
            .bind(like_pattern(&query.search))
            .bind(query.bbox.min_x)
            .bind(query.bbox.min_y)
            .bind(query.bbox.max_x)
            .bind(query.bbox.max_y)
            .bind(SRID)
            .bind(query.limit())
            .fetch_all(&self.pool)
            .await?;

        Ok(cities)
    }

    async fn replace(&self, city: &City) -> Result<i64, DbError> {
        let id = city.id.ok_or(DbError::MissingId { resource: "city" })?;

        if Self::overwrite(&self.pool, id, city).await? == 0 {
            return Err(DbError::not_modified(id));
        }
        Ok(id)
    }

    async fn update(&self, patch: CityPatch) -> Result<i64, DbError> {
        let id = patch.id;
        let mut tx = self.pool.begin().await?;

        let mut city = Self::lock_for_update(&mut tx, id).await?;
        patch.apply(&mut city);

        if Self::overwrite(&mut *tx, id, &city).await? == 0 {
            return Err(DbError::not_modified(id));
        }

        tx.commit().await?;
        Ok(id)
    }
}

/// Wrap search text as a literal `LIKE` substring pattern.
///
/// `\`, `%` and `_` are escaped with the default `LIKE` escape character,
/// so user input never acts as a wildcard.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
