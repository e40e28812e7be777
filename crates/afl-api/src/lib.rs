//! AFL API - REST server
//!
//! Registration, login, and token-protected creation of affiliate platforms
//! and links, with OpenAPI documentation served through Swagger UI.

pub mod auth;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod maintenance;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
