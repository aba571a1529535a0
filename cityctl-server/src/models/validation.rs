//! Validation error types

use std::fmt;

/// Validation error for request payloads and query parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field was not supplied
    Missing { field: &'static str },

    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Value doesn't match required format (e.g., GeoJSON Point)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Body or query string could not be decoded at all
    Malformed { source: &'static str, detail: String },
}

impl ValidationError {
    /// Check a string against a maximum length in characters.
    pub fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), Self> {
        if value.chars().count() > max {
            return Err(Self::TooLong { field, max });
        }
        Ok(())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "{} is required", field),
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::Malformed { source, detail } => write!(f, "malformed {}: {}", source, detail),
        }
    }
}

impl std::error::Error for ValidationError {}
