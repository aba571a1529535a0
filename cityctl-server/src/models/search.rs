//! Search options for text and bounding-box queries

use std::fmt::Display;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use super::ValidationError;

/// Row limit applied when the caller gives none
pub const DEFAULT_LIMIT: i64 = 100_000;

/// Axis-aligned rectangle in EPSG:4326 (minX, minY, maxX, maxY)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// The whole world
    pub const WORLD: Self = Self {
        min_x: -180.0,
        min_y: -90.0,
        max_x: 180.0,
        max_y: 90.0,
    };

    /// Whether a point lies inside or on the edge of the box.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

impl FromStr for BoundingBox {
    type Err = ValidationError;

    /// Parse `minX,minY,maxX,maxY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const INVALID: ValidationError = ValidationError::InvalidFormat {
            field: "bbox",
            reason: "expected four comma-separated numbers: minX,minY,maxX,maxY",
        };

        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| INVALID)?;

        match values.as_slice() {
            [min_x, min_y, max_x, max_y] if values.iter().all(|v| v.is_finite()) => Ok(Self {
                min_x: *min_x,
                min_y: *min_y,
                max_x: *max_x,
                max_y: *max_y,
            }),
            _ => Err(INVALID),
        }
    }
}

/// Text search: case-sensitive substring on name or description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextQuery {
    pub search: String,
    pub limit: Option<i64>,
}

impl TextQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

/// Text search restricted to a bounding box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialQuery {
    pub search: String,
    pub bbox: BoundingBox,
    pub limit: Option<i64>,
}

impl SpatialQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

/// Response shape selected by `f=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    GeoJson,
}

impl OutputFormat {
    /// Anything other than `geojson` means plain JSON.
    pub fn from_param(f: Option<&str>) -> Self {
        match f {
            Some("geojson") => Self::GeoJson,
            _ => Self::Json,
        }
    }
}

/// Query string for the search and single-record routes
///
/// An empty `limit=` or `bbox=` counts as not given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub bbox: Option<String>,
    pub f: Option<String>,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

impl SearchParams {
    pub fn format(&self) -> OutputFormat {
        OutputFormat::from_param(self.f.as_deref())
    }

    pub fn text_query(&self) -> Result<TextQuery, ValidationError> {
        Ok(TextQuery {
            search: self.search.clone().unwrap_or_default(),
            limit: self.checked_limit()?,
        })
    }

    pub fn spatial_query(&self) -> Result<SpatialQuery, ValidationError> {
        let bbox = match self.bbox.as_deref() {
            Some(raw) => raw.parse()?,
            None => BoundingBox::WORLD,
        };

        Ok(SpatialQuery {
            search: self.search.clone().unwrap_or_default(),
            bbox,
            limit: self.checked_limit()?,
        })
    }

    fn checked_limit(&self) -> Result<Option<i64>, ValidationError> {
        match self.limit {
            Some(n) if n < 0 => Err(ValidationError::InvalidFormat {
                field: "limit",
                reason: "must not be negative",
            }),
            other => Ok(other),
        }
    }
}
