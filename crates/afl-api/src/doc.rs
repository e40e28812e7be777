//! OpenAPI documentation
//!
//! [`ApiDoc`] collects every handler path and request/response schema. It is
//! served by Swagger UI at `/swagger-ui`, with the raw document at
//! `/api-docs/openapi.json`.

use crate::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::error::ErrorBody;
use crate::handlers::affiliate_links::CreateAffiliateLinkRequest;
use crate::handlers::health::HealthResponse;
use crate::handlers::platforms::CreatePlatformRequest;
use crate::handlers::MessageResponse;
use crate::validation::Violation;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Scheme name referenced by the protected paths
pub const BEARER_AUTH: &str = "bearer_auth";

/// Register the bearer JWT security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_AUTH,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token returned by POST /login"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "AFL API",
        description = "Affiliate platform and link management with token authentication."
    ),
    paths(
        crate::handlers::auth::register_handler,
        crate::handlers::auth::login_handler,
        crate::handlers::platforms::create_platform,
        crate::handlers::affiliate_links::create_affiliate_link,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        CreatePlatformRequest,
        CreateAffiliateLinkRequest,
        MessageResponse,
        HealthResponse,
        ErrorBody,
        Violation,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "platforms", description = "Affiliate platforms"),
        (name = "affiliate", description = "Affiliate links"),
        (name = "health", description = "Health checks")
    )
)]
pub struct ApiDoc;
