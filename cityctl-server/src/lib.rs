//! cityctl-server: REST API for point-of-interest records on PostGIS
//!
//! Layers, leaf first:
//! - `models`: the city record, request payloads, GeoJSON shaping
//! - `db`: connection bootstrap, schema, and the `CityStore` gateway
//! - `http`: axum router, extractors, and JSON error mapping

pub mod db;
pub mod http;
pub mod models;

pub use db::{create_pool, CityStore, DbConfig, DbError, PgCityStore};
pub use http::{build_router, run_server, AppState, ServerConfig};
pub use models::City;
