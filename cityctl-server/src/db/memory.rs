//! In-memory `CityStore` for route tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CityStore, DbError};
use crate::models::{City, CityPatch, Point, SpatialQuery, TextQuery};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, City>,
}

/// Mirrors the PostGIS store's semantics over a BTreeMap.
#[derive(Default)]
pub(crate) struct MemoryCityStore {
    table: Mutex<Table>,
    failing: AtomicBool,
}

impl MemoryCityStore {
    /// Make every subsequent call fail as if the connection dropped.
    pub(crate) fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DbError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    fn matching<F>(&self, search: &str, limit: i64, keep: F) -> Result<Vec<City>, DbError>
    where
        F: Fn(&City) -> bool,
    {
        self.check()?;
        let table = self.table.lock().map_err(|_| DbError::Sqlx(sqlx::Error::PoolClosed))?;

        Ok(table
            .rows
            .values()
            .filter(|c| {
                c.name.contains(search)
                    || c.description.as_deref().is_some_and(|d| d.contains(search))
            })
            .filter(|c| keep(c))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn with_table<T>(&self, f: impl FnOnce(&mut Table) -> Result<T, DbError>) -> Result<T, DbError> {
        self.check()?;
        let mut table = self.table.lock().map_err(|_| DbError::Sqlx(sqlx::Error::PoolClosed))?;
        f(&mut table)
    }
}

/// Row as the `geometry(Point, 4326)` column keeps it: elevation dropped.
fn stored(city: &City) -> City {
    let mut row = city.clone();
    row.geometry = city.geometry.as_deref().map(flatten);
    row
}

fn flatten(text: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(text) else {
        return text.to_owned();
    };

    let truncated = match value.get_mut("coordinates").and_then(|c| c.as_array_mut()) {
        Some(coordinates) if coordinates.len() > 2 => {
            coordinates.truncate(2);
            true
        }
        _ => false,
    };

    if truncated {
        value.to_string()
    } else {
        text.to_owned()
    }
}

#[async_trait]
impl CityStore for MemoryCityStore {
    async fn insert(&self, city: &City) -> Result<i64, DbError> {
        self.with_table(|table| {
            table.next_id += 1;
            let id = table.next_id;
            let mut row = stored(city);
            row.id = Some(id);
            table.rows.insert(id, row);
            Ok(id)
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<City, DbError> {
        self.with_table(|table| table.rows.get(&id).cloned().ok_or_else(|| DbError::not_found(id)))
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, DbError> {
        self.with_table(|table| {
            table.rows.remove(&id);
            Ok(true)
        })
    }

    async fn delete_all(&self) -> Result<bool, DbError> {
        self.with_table(|table| {
            table.rows.clear();
            Ok(true)
        })
    }

    async fn search_text(&self, query: &TextQuery) -> Result<Vec<City>, DbError> {
        self.matching(&query.search, query.limit(), |_| true)
    }

    async fn search_spatial(&self, query: &SpatialQuery) -> Result<Vec<City>, DbError> {
        let bbox = query.bbox;
        self.matching(&query.search, query.limit(), |c| {
            c.geometry
                .as_deref()
                .and_then(|g| Point::parse(g).ok())
                .is_some_and(|p| bbox.contains(p.x, p.y))
        })
    }

    async fn replace(&self, city: &City) -> Result<i64, DbError> {
        let id = city.id.ok_or(DbError::MissingId { resource: "city" })?;
        self.with_table(|table| match table.rows.get_mut(&id) {
            Some(row) => {
                *row = stored(city);
                Ok(id)
            }
            None => Err(DbError::not_modified(id)),
        })
    }

    async fn update(&self, patch: CityPatch) -> Result<i64, DbError> {
        let id = patch.id;
        self.with_table(|table| {
            let row = table.rows.get_mut(&id).ok_or_else(|| DbError::not_found(id))?;
            patch.apply(row);
            *row = stored(row);
            Ok(id)
        })
    }
}
