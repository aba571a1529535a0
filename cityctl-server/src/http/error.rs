//! API error types with IntoResponse
//!
//! Every error becomes a JSON body: `{"error": <status code>}`, or `[]` for
//! the collection-style failures of create and search.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Route exists but not for this method (405)
    MethodNotAllowed { method: String, path: String },

    /// Write affected no rows (400)
    NotModified { resource: &'static str, id: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },

    /// Failure reported under a fixed status, the underlying code kept in the body
    Rejected { status: StatusCode, code: StatusCode },

    /// Failure answered with an empty JSON array
    EmptyList { status: StatusCode },
}

impl ApiError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NotModified { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected { status, .. } | Self::EmptyList { status } => *status,
        }
    }

    /// Report a gateway failure as 409 while keeping its own code in the body.
    ///
    /// Validation errors keep their 400.
    pub fn conflict(self) -> Self {
        match self {
            Self::Validation(_) | Self::Rejected { .. } | Self::EmptyList { .. } => self,
            other => {
                other.log();
                Self::Rejected {
                    status: StatusCode::CONFLICT,
                    code: other.status(),
                }
            }
        }
    }

    /// Answer a gateway failure with `[]` under the given status.
    ///
    /// Validation errors keep their 400.
    pub fn empty_list(self, status: StatusCode) -> Self {
        match self {
            Self::Validation(_) | Self::Rejected { .. } | Self::EmptyList { .. } => self,
            other => {
                other.log();
                Self::EmptyList { status }
            }
        }
    }

    fn log(&self) {
        match self {
            Self::Database(e) => tracing::error!("Database error: {}", e),
            Self::Internal { message } => tracing::error!("Internal error: {}", message),
            Self::Validation(e) => tracing::debug!("Validation error: {}", e),
            Self::NotFound { resource, id } => tracing::debug!("{} '{}' not found", resource, id),
            Self::MethodNotAllowed { method, path } => {
                tracing::debug!("{} not allowed on {}", method, path)
            }
            Self::NotModified { resource, id } => {
                tracing::debug!("{} '{}' not modified", resource, id)
            }
            Self::Rejected { .. } | Self::EmptyList { .. } => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status();
        let body = match &self {
            Self::EmptyList { .. } => json!([]),
            Self::Rejected { code, .. } => json!({ "error": code.as_u16() }),
            _ => json!({ "error": status.as_u16() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::NotModified { resource, id } => Self::NotModified { resource, id },
            DbError::MissingId { .. } => {
                Self::Validation(ValidationError::Missing { field: "id" })
            }
            DbError::Sqlx(_) => Self::Database(e),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("stored geometry is not valid GeoJSON: {}", e),
        }
    }
}
