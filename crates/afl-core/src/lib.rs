//! AFL Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the AFL service:
//! - Domain records (users, platforms, affiliate links)
//! - Common error types
//! - Async store traits implemented by `afl-store`
//! - Configuration management

pub mod config;
pub mod models;
pub mod store;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, RateLimitConfig,
    SchedulerConfig, ServerConfig, StoreBackend,
};
pub use models::{
    is_url_with_scheme, is_valid_link_url, normalize_email, AffiliateLink, NewPlatform, Platform,
    User, UserRole, LINK_URL_SCHEMES,
};
pub use store::{AffiliateLinkStore, PlatformStore, Store, UserStore};

use thiserror::Error;

/// Core error types for AFL operations
#[derive(Error, Debug)]
pub enum AflError {
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for AflError {
    fn from(err: ConfigError) -> Self {
        AflError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AflError>;
