//! Route handlers organized by resource

pub mod cities;
pub mod health;

use axum::http::{Method, Uri};

use super::error::ApiError;

/// Fallback for unknown paths, so even misses answer in JSON
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        resource: "route",
        id: uri.path().to_owned(),
    }
}

/// Answer for a known path used with an unsupported method
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_owned(),
    }
}
