//! Shared API types
//!
//! Error envelope and query-parameter validation shared by all endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use validator::ValidationError;

use crate::core::constants::{MAX_EVENTS_PER_BATCH, QUERY_MAX_ANOMALY_LIMIT};

/// Maximum ID length accepted in paths and payloads
pub const MAX_ID_LENGTH: usize = 256;

/// Validator function for user/integration identifiers
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::new("id_length")
            .with_message(format!("ID must be 1-{} characters", MAX_ID_LENGTH).into()));
    }
    Ok(())
}

/// Validator function for anomaly list limits
pub fn validate_anomaly_limit(limit: u32) -> Result<(), ValidationError> {
    if limit == 0 || limit > QUERY_MAX_ANOMALY_LIMIT {
        return Err(ValidationError::new("limit_range").with_message(
            format!("Limit must be between 1 and {}", QUERY_MAX_ANOMALY_LIMIT).into(),
        ));
    }
    Ok(())
}

/// Validator function for ingestion batch size
pub fn validate_event_batch<T>(events: &[T]) -> Result<(), ValidationError> {
    if events.is_empty() {
        return Err(
            ValidationError::new("events_empty").with_message("Events cannot be empty".into())
        );
    }
    if events.len() > MAX_EVENTS_PER_BATCH {
        return Err(ValidationError::new("events_too_many").with_message(
            format!("Cannot ingest more than {} events at once", MAX_EVENTS_PER_BATCH).into(),
        ));
    }
    Ok(())
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn from_sqlite(e: crate::data::sqlite::SqliteError) -> Self {
        tracing::error!(error = %e, "SQLite error");
        Self::Internal {
            message: "Database operation failed".to_string(),
        }
    }

    pub fn from_validation(e: validator::ValidationErrors) -> Self {
        Self::BadRequest {
            code: "VALIDATION".to_string(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id_bounds() {
        assert!(validate_id("user-1").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id(&"x".repeat(257)).is_err());
    }

    #[test]
    fn test_validate_anomaly_limit() {
        assert!(validate_anomaly_limit(50).is_ok());
        assert!(validate_anomaly_limit(0).is_err());
        assert!(validate_anomaly_limit(QUERY_MAX_ANOMALY_LIMIT + 1).is_err());
    }

    #[test]
    fn test_validate_event_batch() {
        assert!(validate_event_batch(&[1, 2, 3]).is_ok());
        assert!(validate_event_batch::<i32>(&[]).is_err());
        assert!(validate_event_batch(&vec![0u8; MAX_EVENTS_PER_BATCH + 1]).is_err());
    }
}
