//! Application state management
//!
//! Everything a request needs is built once here and passed in through
//! axum state; nothing lives in globals.
//!
//! Author: hephaex@gmail.com

use crate::auth::jwt::{JwtConfig, TokenService};
use crate::auth::password::{PasswordConfig, PasswordError, PasswordService};
use crate::auth::service::AuthService;
use crate::middleware::rate_limit::FixedWindowLimiter;
use afl_core::{AppConfig, Store};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Document store
    pub store: Arc<dyn Store>,
    /// Register and login flows
    pub auth: AuthService,
    /// Token verification for the auth gate
    pub tokens: TokenService,
    /// Per-client request counters
    pub rate_limiter: Arc<FixedWindowLimiter>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state from config and an opened store
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, PasswordError> {
        let tokens = TokenService::new(JwtConfig::from(&config.auth));
        let passwords = PasswordService::new(PasswordConfig::from(&config.auth))?;
        let auth = AuthService::new(store.clone(), passwords, tokens.clone());
        let rate_limiter = Arc::new(FixedWindowLimiter::from_config(
            &config.rate_limit,
            config.server.trust_proxy_headers,
        ));

        Ok(Self {
            config,
            store,
            auth,
            tokens,
            rate_limiter,
            start_time: Instant::now(),
        })
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
