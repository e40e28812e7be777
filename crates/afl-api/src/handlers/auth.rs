//! Authentication API handlers
//!
//! Provides the public registration and login endpoints.
//!
//! Author: hephaex@gmail.com

use super::MessageResponse;
use crate::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::validation::ValidatedJson;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// Register a new user account
///
/// New users get the `user` role. Emails are compared case-insensitively.
///
/// # Responses
///
/// * `201 Created` - User registered
/// * `400 Bad Request` - Validation failed
/// * `409 Conflict` - Email already registered
/// * `500 Internal Server Error` - Server error
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = MessageResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "User already exists", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(
            "User registered successfully",
            user.id,
        )),
    ))
}

/// Login with email and password
///
/// Returns a bearer token valid for one hour. An unknown email and a wrong
/// password get the same answer.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation failed or invalid credentials", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}
