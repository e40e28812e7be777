//! API error handling
//!
//! Every failure leaves the service as `{ "success": false, "message": ... }`,
//! plus the per-field list for validation failures. Server-side faults are
//! logged in full and answered with a generic message.

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::validation::Violation;
use afl_core::AflError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Message returned for every 5xx
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Message returned for any failed login
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always false
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Field violations, in field declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Violation>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<Violation>) -> Self {
        self.errors = errors;
        self
    }
}

/// Build an error response with the shared body shape
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<Violation>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(errors) => {
                ErrorBody::new("Validation failed").with_errors(errors)
            }
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::UnprocessableEntity(msg) => ErrorBody::new(msg),
            AppError::InvalidCredentials => ErrorBody::new(INVALID_CREDENTIALS_MESSAGE),
            AppError::Internal(msg) | AppError::Database(msg) => {
                tracing::error!(error = %msg, status = status.as_u16(), "Request failed");
                ErrorBody::new(SERVER_ERROR_MESSAGE)
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

impl From<AflError> for AppError {
    fn from(err: AflError) -> Self {
        match err {
            AflError::Duplicate(msg) => AppError::Conflict(msg),
            AflError::ValidationError(msg) => AppError::BadRequest(msg),
            AflError::DatabaseError(msg) => AppError::Database(msg),
            AflError::ConfigError(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            AflError::Other(err) => AppError::Internal(format!("{err:#}")),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        AppError::Internal(err.to_string())
    }
}
