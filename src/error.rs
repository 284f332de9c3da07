use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application error type, mapped onto HTTP responses for the JSON API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input, reported with field-level detail (400)
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Referenced entity absent (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// A submission already carries its maximum of five reviewers (409)
    #[error("reviewer limit reached, cannot assign reviewer {reviewer_id}")]
    AssignmentLimitExceeded { reviewer_id: Uuid },

    /// Critical role change attempted without the confirming second call (409)
    #[error("confirmation required to change role of user {user_id} from {current_role} to {requested_role}")]
    ConfirmationRequired {
        user_id: Uuid,
        current_role: String,
        requested_role: String,
    },

    /// Database operation error (500)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": {
                        "code": "VALIDATION_ERROR",
                        "field": field,
                        "message": message,
                    }
                }),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": {
                        "code": "NOT_FOUND",
                        "message": what,
                    }
                }),
            ),
            AppError::AssignmentLimitExceeded { reviewer_id } => (
                StatusCode::CONFLICT,
                json!({
                    "error": {
                        "code": "ASSIGNMENT_LIMIT_EXCEEDED",
                        "reviewer_id": reviewer_id,
                        "message": self.to_string(),
                    }
                }),
            ),
            AppError::ConfirmationRequired {
                user_id,
                current_role,
                requested_role,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": {
                        "code": "CONFIRMATION_REQUIRED",
                        "user_id": user_id,
                        "current_role": current_role,
                        "requested_role": requested_role,
                        "message": self.to_string(),
                    }
                }),
            ),
            AppError::Database(err) => {
                tracing::error!("database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": {
                            "code": "INTERNAL_ERROR",
                            "message": "internal server error",
                        }
                    }),
                )
            }
            AppError::Io(err) => {
                tracing::error!("IO error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": {
                            "code": "INTERNAL_ERROR",
                            "message": "internal server error",
                        }
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type AppResult<T> = Result<T, AppError>;
