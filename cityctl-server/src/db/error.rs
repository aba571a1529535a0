//! Gateway error type

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("not modified: {resource} '{id}'")]
    NotModified { resource: &'static str, id: String },

    #[error("{resource} has no id")]
    MissingId { resource: &'static str },
}

impl DbError {
    pub(crate) fn not_found(id: i64) -> Self {
        Self::NotFound {
            resource: "city",
            id: id.to_string(),
        }
    }

    pub(crate) fn not_modified(id: i64) -> Self {
        Self::NotModified {
            resource: "city",
            id: id.to_string(),
        }
    }
}
