//! Platform handlers

use super::MessageResponse;
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::validation::{FieldRules, Validated, ValidatedJson, PLATFORM_RULES};
use afl_core::{NewPlatform, Platform};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Platform creation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlatformRequest {
    #[schema(example = "ShopLink")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Duplicates are dropped, first-seen order kept
    #[serde(default)]
    #[schema(example = json!(["fashion", "outdoor"]))]
    pub niches: Vec<String>,
    #[serde(default)]
    #[schema(example = 7.5)]
    pub commission_rate: f64,
    #[serde(default)]
    #[schema(example = "https://api.shoplink.example.com")]
    pub api_url: String,
}

impl Validated for CreatePlatformRequest {
    const RULES: &'static [FieldRules] = PLATFORM_RULES;
}

impl From<CreatePlatformRequest> for NewPlatform {
    fn from(request: CreatePlatformRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            niches: request.niches,
            commission_rate: request.commission_rate,
            api_url: request.api_url,
        }
    }
}

/// Create a platform
#[utoipa::path(
    post,
    path = "/platform",
    tag = "platforms",
    request_body = CreatePlatformRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Platform created successfully", body = MessageResponse),
        (status = 400, description = "Validation failed or invalid token", body = ErrorBody),
        (status = 401, description = "No token provided", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody),
    )
)]
pub async fn create_platform(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreatePlatformRequest>,
) -> Result<impl IntoResponse, AppError> {
    let platform = Platform::new(request.into());
    state.store.create_platform(&platform).await?;

    tracing::info!(platform_id = %platform.id, created_by = %user.user_id, "Platform created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(
            "Platform created successfully",
            platform.id,
        )),
    ))
}
