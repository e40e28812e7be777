//! Affiliate link handlers
//!
//! A link is only stored when its URL is well formed and its platform
//! exists.

use super::MessageResponse;
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::validation::{FieldRules, Validated, ValidatedJson, Violation, AFFILIATE_LINK_RULES};
use afl_core::AffiliateLink;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

pub const PLATFORM_NOT_FOUND_MESSAGE: &str = "Platform not found";

/// Affiliate link creation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAffiliateLinkRequest {
    /// ftp, http or https URL
    #[schema(example = "https://shop.example.com/p/123?ref=afl")]
    pub url: String,
    #[schema(example = "c56a4180-65aa-42ec-a945-5fd21dec0538")]
    pub platform_id: String,
}

impl Validated for CreateAffiliateLinkRequest {
    const RULES: &'static [FieldRules] = AFFILIATE_LINK_RULES;
}

/// Create an affiliate link
#[utoipa::path(
    post,
    path = "/affiliate",
    tag = "affiliate",
    request_body = CreateAffiliateLinkRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Affiliate link created successfully", body = MessageResponse),
        (status = 400, description = "Validation failed or invalid token", body = ErrorBody),
        (status = 401, description = "No token provided", body = ErrorBody),
        (status = 422, description = "Platform not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody),
    )
)]
pub async fn create_affiliate_link(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateAffiliateLinkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let platform_id = Uuid::parse_str(request.platform_id.trim()).map_err(|_| {
        AppError::Validation(vec![Violation::new(
            "platformId",
            "Platform id must be a valid id",
        )])
    })?;

    let link = AffiliateLink::new(request.url, platform_id)?;

    if !state.store.platform_exists(platform_id).await? {
        tracing::info!(platform_id = %platform_id, "Affiliate link rejected: unknown platform");
        return Err(AppError::UnprocessableEntity(
            PLATFORM_NOT_FOUND_MESSAGE.to_string(),
        ));
    }

    state.store.create_affiliate_link(&link).await?;

    tracing::info!(link_id = %link.id, platform_id = %platform_id, created_by = %user.user_id, "Affiliate link created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(
            "Affiliate link created successfully",
            link.id,
        )),
    ))
}
