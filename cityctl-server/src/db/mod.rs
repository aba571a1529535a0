//! Database layer - connection bootstrap, schema and the city gateway
//!
//! # Design Principles
//!
//! - Connection pool with an explicit size - no Arc<Mutex<Connection>>
//! - One parameterized statement per operation, except update (transaction)
//! - Geometry crosses this boundary only as GeoJSON text

pub mod config;
pub mod error;
pub mod pool;
pub mod repos;
pub mod schema;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use config::{ConnectTarget, DbConfig, DEFAULT_MAX_CONNECTIONS};
pub use error::DbError;
pub use pool::create_pool;
pub use repos::PgCityStore;
pub use schema::{create_schema, ensure_schema};
pub use store::CityStore;
