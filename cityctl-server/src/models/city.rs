//! City record and the request payloads that produce it

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use super::geojson::GeometryText;
use super::ValidationError;

/// Maximum length for city names (matches `VARCHAR(128)`)
pub const MAX_NAME_LEN: usize = 128;

/// Maximum length for descriptions (matches `VARCHAR(1024)`)
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// City / point-of-interest record.
///
/// Plain transport shape: `id` is `None` until the record is persisted,
/// `geometry` is GeoJSON Point text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct City {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub population: Option<i32>,
    pub geometry: Option<String>,
}

/// Body of `POST /cities`
#[derive(Debug, Default, Deserialize)]
pub struct CreateCityRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub population: Option<i32>,
    pub geometry: Option<GeometryText>,
}

impl CreateCityRequest {
    /// Validate into an unsaved city.
    pub fn into_city(self) -> Result<City, ValidationError> {
        let name = validate_name(self.name.ok_or(ValidationError::Missing { field: "name" })?)?;

        Ok(City {
            id: None,
            name,
            description: validate_description(self.description)?,
            population: validate_population(self.population)?,
            geometry: validate_geometry(self.geometry)?,
        })
    }
}

/// Body of `PUT /cities`: full replacement, `id` required
#[derive(Debug, Default, Deserialize)]
pub struct ReplaceCityRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub population: Option<i32>,
    pub geometry: Option<GeometryText>,
}

impl ReplaceCityRequest {
    /// Validate into a city carrying its id.
    pub fn into_city(self) -> Result<City, ValidationError> {
        let id = self.id.ok_or(ValidationError::Missing { field: "id" })?;
        let mut city = CreateCityRequest {
            name: self.name,
            description: self.description,
            population: self.population,
            geometry: self.geometry,
        }
        .into_city()?;

        city.id = Some(id);
        Ok(city)
    }
}

/// Body of `PATCH /cities`.
///
/// Nullable fields distinguish "absent" (`None`) from "provided"
/// (`Some(value)`, where an explicit JSON `null` is `Some(None)`).
#[derive(Debug, Default, Deserialize)]
pub struct PatchCityRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub population: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub geometry: Option<Option<GeometryText>>,
}

/// Marks a field that appeared in the payload, even as `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PatchCityRequest {
    /// Validate the provided fields into a patch.
    pub fn into_patch(self) -> Result<CityPatch, ValidationError> {
        let id = self.id.ok_or(ValidationError::Missing { field: "id" })?;

        Ok(CityPatch {
            id,
            name: self.name.map(validate_name).transpose()?,
            description: self.description.map(validate_description).transpose()?,
            population: self.population.map(validate_population).transpose()?,
            geometry: self.geometry.map(validate_geometry).transpose()?,
        })
    }
}

/// Partial update for one stored city.
///
/// Only `Some` fields overwrite; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityPatch {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub population: Option<Option<i32>>,
    pub geometry: Option<Option<String>>,
}

impl CityPatch {
    /// Overlay the provided fields onto a stored city.
    pub fn apply(self, city: &mut City) {
        if let Some(name) = self.name {
            city.name = name;
        }
        if let Some(description) = self.description {
            city.description = description;
        }
        if let Some(population) = self.population {
            city.population = population;
        }
        if let Some(geometry) = self.geometry {
            city.geometry = geometry;
        }
    }
}

fn validate_name(name: String) -> Result<String, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }
    ValidationError::check_len("name", &name, MAX_NAME_LEN)?;
    Ok(name)
}

fn validate_description(description: Option<String>) -> Result<Option<String>, ValidationError> {
    if let Some(text) = &description {
        ValidationError::check_len("description", text, MAX_DESCRIPTION_LEN)?;
    }
    Ok(description)
}

fn validate_population(population: Option<i32>) -> Result<Option<i32>, ValidationError> {
    match population {
        Some(n) if n < 0 => Err(ValidationError::InvalidFormat {
            field: "population",
            reason: "must not be negative",
        }),
        other => Ok(other),
    }
}

fn validate_geometry(geometry: Option<GeometryText>) -> Result<Option<String>, ValidationError> {
    geometry
        .map(|text| -> Result<String, ValidationError> {
            text.validate()?;
            Ok(text.into_string())
        })
        .transpose()
}
