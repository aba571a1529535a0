//! Domain models
//!
//! `City` is a plain record. Request payloads validate into it (or into a
//! `CityPatch`) and invalid input returns `ValidationError`, not panic.

pub mod city;
pub mod geojson;
pub mod search;
pub mod validation;

pub use city::{City, CityPatch, CreateCityRequest, PatchCityRequest, ReplaceCityRequest};
pub use geojson::{Feature, FeatureCollection, GeometryText, Point};
pub use search::{BoundingBox, OutputFormat, SearchParams, SpatialQuery, TextQuery, DEFAULT_LIMIT};
pub use validation::ValidationError;
