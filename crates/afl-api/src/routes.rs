//! API route definitions
//!
//! Layers, innermost first: body limit, panic catcher, rate limit, CORS,
//! security headers, request tracing. Security headers sit outside the rate
//! limiter and CORS so rejections carry them too.
//!
//! Author: hephaex@gmail.com

use crate::auth::middleware::auth_middleware;
use crate::doc::ApiDoc;
use crate::error::{error_response, AppError, SERVER_ERROR_MESSAGE};
use crate::handlers::{affiliate_links, auth, health, platforms};
use crate::middleware::{rate_limit_middleware, security_headers_middleware};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Routes under the auth gate and the public ones
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/health", get(health::health_check));

    let protected_routes = Router::new()
        .route("/platform", post(platforms::create_platform))
        .route("/affiliate", post(affiliate_links::create_affiliate_link))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Build the complete application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    let mut router = api_routes(state.clone())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(CatchPanicLayer::custom(handle_panic));

    if state.config.rate_limit.enabled {
        router = router.layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));
    }

    router
        .layer(cors_layer(&server.cors_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins; `*` allows any origin, none allows no cross-origin caller
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "Request handler panicked");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE)
}
