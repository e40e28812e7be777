//! Authentication module
//!
//! - Token issuance and verification
//! - Password hashing with Argon2
//! - Middleware guarding protected routes
//! - Register/login service

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{Claims, Identity, JwtConfig, JwtError, TokenService};
pub use middleware::{auth_middleware, AuthError, AuthenticatedUser};
pub use password::{PasswordConfig, PasswordError, PasswordService};
pub use service::{AuthService, LoginRequest, LoginResponse, RegisterRequest};
