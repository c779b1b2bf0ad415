//! Error taxonomy for the HTTP surface.
//!
//! Every failure a client can see maps to one of these variants, and every
//! failure response carries a JSON body with an `error` key.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::storage::StorageError;

/// Handler-level errors, mapped to HTTP statuses on the way out.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed task fields.
    #[error("{0}")]
    Validation(String),

    /// Unknown task id.
    #[error("Task {0} not found")]
    TaskNotFound(i64),

    /// Storage query failure. Logged in full; clients get a generic message.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label, message) = match &self {
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "Validation Error", msg.clone())
            }
            ApiError::TaskNotFound(_) => (StatusCode::NOT_FOUND, "Not Found", self.to_string()),
            ApiError::Storage(e) => {
                tracing::error!("Storage error while handling request: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    e.to_string(),
                )
            }
        };

        (status, Json(json!({ "error": label, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let response = ApiError::Validation("title is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::TaskNotFound(7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
