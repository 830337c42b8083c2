/// Unified error types for Cinelog
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the catalog service
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Entity absent or soft-deleted
    #[error("{entity} with {field} {value} not found")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Unique constraint violation
    #[error("{entity} with {field} {value} already exists")]
    AlreadyExists {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Optimistic-concurrency conflict: the stored version moved on
    #[error("{entity} with {field} {value} was modified after version {version}")]
    VersionMismatch {
        entity: &'static str,
        field: &'static str,
        value: String,
        version: i64,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Internal server errors, correlated through the incident id
    #[error("Internal error [{incident_id}]: {message}")]
    Internal { incident_id: Uuid, message: String },
}

impl CatalogError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl Display) -> Self {
        CatalogError::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, field: &'static str, value: impl Display) -> Self {
        CatalogError::AlreadyExists {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn version_mismatch(
        entity: &'static str,
        field: &'static str,
        value: impl Display,
        version: i64,
    ) -> Self {
        CatalogError::VersionMismatch {
            entity,
            field,
            value: value.to_string(),
            version,
        }
    }

    pub fn internal(message: impl Display) -> Self {
        CatalogError::Internal {
            incident_id: Uuid::new_v4(),
            message: message.to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CatalogError::Internal { .. })
    }

    /// Message that is safe to hand to a client
    fn safe_message(&self) -> String {
        match self {
            CatalogError::Internal { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::internal(format!("Database error: {}", e))
    }
}

impl From<sqlx::migrate::MigrateError> for CatalogError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        CatalogError::internal(format!("Migration failed: {}", e))
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::internal(format!("IO error: {}", e))
    }
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(e: validator::ValidationErrors) -> Self {
        CatalogError::Validation(e.to_string())
    }
}

/// Error body returned to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
}

/// Convert CatalogError to HTTP response
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            CatalogError::NotFound { .. } => (StatusCode::NOT_FOUND, "NotFound"),
            CatalogError::AlreadyExists { .. } => (StatusCode::CONFLICT, "AlreadyExists"),
            CatalogError::VersionMismatch { .. } => (StatusCode::CONFLICT, "VersionMismatch"),
            CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            CatalogError::Authentication(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            CatalogError::Authorization(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            CatalogError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError")
            }
        };

        let incident_id = match &self {
            CatalogError::Internal {
                incident_id,
                message,
            } => {
                tracing::error!(%incident_id, "{}", message);
                Some(incident_id.to_string())
            }
            other => {
                tracing::warn!("{}", other);
                None
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message: self.safe_message(),
            incident_id,
        });

        (status, body).into_response()
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_message_is_not_leaked() {
        let err = CatalogError::internal("connection reset by peer");
        assert!(err.is_internal());
        assert_eq!(err.safe_message(), "Internal server error");
        assert!(err.to_string().contains("connection reset by peer"));
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (CatalogError::not_found("movie", "id", 7), StatusCode::NOT_FOUND),
            (
                CatalogError::already_exists("genre", "name", "Drama"),
                StatusCode::CONFLICT,
            ),
            (
                CatalogError::version_mismatch("movie", "id", 7, 0),
                StatusCode::CONFLICT,
            ),
            (
                CatalogError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CatalogError::Authentication("no token".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                CatalogError::Authorization("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                CatalogError::internal("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_version_mismatch_message() {
        let err = CatalogError::version_mismatch("movie", "id", 42, 3);
        assert_eq!(err.to_string(), "movie with id 42 was modified after version 3");
    }
}
