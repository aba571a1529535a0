//! GeoJSON shaping for city records
//!
//! Geometry travels as GeoJSON text everywhere except in Feature output,
//! where it is embedded as a parsed object.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::city::City;
use super::ValidationError;

/// GeoJSON geometry as text.
///
/// Accepts either a JSON string holding GeoJSON or an inline GeoJSON object,
/// which is re-encoded to compact text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryText(String);

impl GeometryText {
    /// Wrap GeoJSON text without validation.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Validate that the text is a GeoJSON Point.
    pub fn validate(&self) -> Result<Point, ValidationError> {
        Point::parse(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for GeometryText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::String(text) => Ok(Self(text)),
            value @ JsonValue::Object(_) => Ok(Self(value.to_string())),
            other => Err(de::Error::custom(format!(
                "geometry must be GeoJSON text or object, got {}",
                other
            ))),
        }
    }
}

/// Planar position of a GeoJSON Point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<f64>,
}

impl Point {
    /// Parse GeoJSON Point text.
    ///
    /// Accepts 2 or 3 coordinates (an optional elevation is ignored).
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let raw: RawGeometry =
            serde_json::from_str(text).map_err(|_| ValidationError::InvalidFormat {
                field: "geometry",
                reason: "must be a GeoJSON geometry with numeric coordinates",
            })?;

        if raw.kind != "Point" {
            return Err(ValidationError::InvalidFormat {
                field: "geometry",
                reason: "geometry type must be Point",
            });
        }

        match raw.coordinates.as_slice() {
            [x, y] | [x, y, _] if x.is_finite() && y.is_finite() => Ok(Self { x: *x, y: *y }),
            _ => Err(ValidationError::InvalidFormat {
                field: "geometry",
                reason: "Point needs 2 or 3 finite coordinates",
            }),
        }
    }
}

/// Feature properties: every record field except id and geometry
#[derive(Debug, Clone, Serialize)]
pub struct FeatureProperties {
    pub name: String,
    pub description: Option<String>,
    pub population: Option<i32>,
}

/// GeoJSON Feature wrapping one city
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: FeatureProperties,
    pub geometry: JsonValue,
}

impl Feature {
    /// Shape a city as a Feature, parsing its stored geometry text.
    ///
    /// A record without geometry gets `"geometry": null`.
    pub fn from_city(city: City) -> Result<Self, serde_json::Error> {
        let geometry = match city.geometry.as_deref() {
            Some(text) => serde_json::from_str(text)?,
            None => JsonValue::Null,
        };

        Ok(Self {
            id: city.id,
            kind: "Feature",
            properties: FeatureProperties {
                name: city.name,
                description: city.description,
                population: city.population,
            },
            geometry,
        })
    }
}

/// GeoJSON FeatureCollection
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_cities(cities: Vec<City>) -> Result<Self, serde_json::Error> {
        let features = cities
            .into_iter()
            .map(Feature::from_city)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            kind: "FeatureCollection",
            features,
        })
    }
}
