//! HTTP middleware applied around the router

pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::{rate_limit_middleware, FixedWindowLimiter, RateLimitResult};
pub use security_headers::security_headers_middleware;
