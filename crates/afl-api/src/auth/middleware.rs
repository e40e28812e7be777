//! Authentication middleware for protecting routes
//!
//! Extracts and validates the bearer token from the Authorization header.
//! A request without a token and a request with a bad token are rejected
//! differently: 401 for the former, 400 for the latter. Signature, expiry
//! and format failures all share the one "invalid token" answer.
//!
//! Author: hephaex@gmail.com

use super::jwt::{Identity, JwtError};
use crate::error::error_response;
use crate::state::AppState;
use afl_core::UserRole;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub const MISSING_TOKEN_MESSAGE: &str = "Access denied. No token provided.";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token.";

/// Authenticated user information extracted from the token
///
/// Added to request extensions by [`auth_middleware`]; extract it in
/// handlers with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl From<Identity> for AuthenticatedUser {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            role: identity.role,
        }
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingToken => {
                error_response(StatusCode::UNAUTHORIZED, MISSING_TOKEN_MESSAGE)
            }
            AuthError::InvalidToken(_) => {
                error_response(StatusCode::BAD_REQUEST, INVALID_TOKEN_MESSAGE)
            }
        }
    }
}

/// Pull the raw token out of the Authorization header.
///
/// The `Bearer ` prefix is optional; whatever remains is the token.
fn extract_token(request: &Request<Body>) -> Result<&str, AuthError> {
    let value = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::InvalidToken(JwtError::InvalidToken))?,
        None => return Err(AuthError::MissingToken),
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Authentication middleware that requires a valid token
///
/// ```ignore
/// let protected = Router::new()
///     .route("/platform", post(create_platform))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = match extract_token(&request) {
        Ok(token) => token,
        Err(e) => {
            tracing::info!(path = %request.uri().path(), reason = %e, "Rejected unauthenticated request");
            return Err(e);
        }
    };

    let identity = match state.tokens.verify(token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(path = %request.uri().path(), reason = %e, "Rejected invalid token");
            return Err(AuthError::InvalidToken(e));
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(identity));

    Ok(next.run(request).await)
}
