//! Error handling for the folio HTTP layer.
//!
//! Every failure recovered at a handler boundary renders as
//! `{"error": <message>}` with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application error types that map to HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        /// Field-keyed validation messages.
        details: serde_json::Value,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("method not allowed: {message}")]
    MethodNotAllowed { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error with field-keyed details.
    pub fn validation(details: serde_json::Value, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a method not allowed error.
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();

        let (status, message, details) = match self {
            AppError::Validation { details, message } => {
                (StatusCode::BAD_REQUEST, message, Some(details))
            }
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message, None),
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message, None),
            AppError::MethodNotAllowed { message } => {
                (StatusCode::METHOD_NOT_ALLOWED, message, None)
            }
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
        };

        tracing::error!(
            error_id = %error_id,
            status_code = %status.as_u16(),
            message = %message,
            "request error"
        );

        // Hide internal error details outside debug builds.
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let body = match details {
            Some(details) => json!({ "error": message, "details": details }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
