//! Persistence gateway interface
//!
//! Handlers talk to this trait rather than to the pool, so routes can be
//! exercised against an in-memory double.

use async_trait::async_trait;

use super::DbError;
use crate::models::{City, CityPatch, SpatialQuery, TextQuery};

/// Typed operations over the city table.
#[async_trait]
pub trait CityStore: Send + Sync {
    /// Persist a new city and return its generated id.
    async fn insert(&self, city: &City) -> Result<i64, DbError>;

    /// Fetch one city; `DbError::NotFound` when no row matches.
    async fn get_by_id(&self, id: i64) -> Result<City, DbError>;

    /// Delete one city. Succeeds even when nothing matched.
    async fn delete_by_id(&self, id: i64) -> Result<bool, DbError>;

    /// Delete every city. Succeeds even when the table is empty.
    async fn delete_all(&self) -> Result<bool, DbError>;

    /// Case-sensitive substring search on name or description.
    ///
    /// The text is matched literally: `%` and `_` are not wildcards, so a
    /// search for `_` only finds records containing an underscore.
    async fn search_text(&self, query: &TextQuery) -> Result<Vec<City>, DbError>;

    /// Substring search restricted to a bounding box.
    async fn search_spatial(&self, query: &SpatialQuery) -> Result<Vec<City>, DbError>;

    /// Overwrite every field of an existing city.
    ///
    /// `DbError::MissingId` without an id, `DbError::NotModified` when no
    /// row was affected.
    async fn replace(&self, city: &City) -> Result<i64, DbError>;

    /// Merge the provided fields into an existing city.
    async fn update(&self, patch: CityPatch) -> Result<i64, DbError>;
}
