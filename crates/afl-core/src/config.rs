//! AFL Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development. Environment values always win
//! over file values.
//!
//! Author: hephaex@gmail.com

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Document store connection
    pub database: DatabaseConfig,

    /// Token signing and password hashing
    pub auth: AuthConfig,

    /// Request throttling
    pub rate_limit: RateLimitConfig,

    /// Daily maintenance job
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Apply environment variables on top of this configuration
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        // Server
        if let Some(host) = env_var("API_HOST") {
            self.server.host = host;
        }
        if let Some((key, port)) = first_env(&["PORT", "API_PORT"]) {
            self.server.port = parse_value(key, port)?;
        }
        if let Some(origins) = env_var("CORS_ORIGINS").or_else(|| env_var("CORS_ORIGIN")) {
            self.server.cors_origins = split_list(&origins);
        }
        if let Some(size) = env_var("MAX_BODY_SIZE") {
            self.server.max_body_size = parse_value("MAX_BODY_SIZE", size)?;
        }
        if let Some(trust) = env_var("TRUST_PROXY_HEADERS") {
            self.server.trust_proxy_headers = parse_bool("TRUST_PROXY_HEADERS", trust)?;
        }

        // Store
        if let Some(backend) = env_var("STORE_BACKEND") {
            self.database.backend = backend.parse()?;
        }
        if let Some(url) = env_var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(user) = env_var("DATABASE_USER") {
            self.database.username = user;
        }
        if let Some(pass) = env_var("DATABASE_PASS") {
            self.database.password = pass;
        }
        if let Some(ns) = env_var("DATABASE_NS") {
            self.database.namespace = ns;
        }
        if let Some(db) = env_var("DATABASE_DB") {
            self.database.database = db;
        }

        // Auth
        if let Some(secret) = env_var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = env_var("JWT_EXPIRATION_SECS") {
            self.auth.token_ttl_secs = parse_value("JWT_EXPIRATION_SECS", ttl)?;
        }
        if let Some(issuer) = env_var("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Some(memory) = env_var("PASSWORD_HASH_MEMORY_KIB") {
            self.auth.hash_memory_kib = parse_value("PASSWORD_HASH_MEMORY_KIB", memory)?;
        }
        if let Some(iterations) = env_var("PASSWORD_HASH_ITERATIONS") {
            self.auth.hash_iterations = parse_value("PASSWORD_HASH_ITERATIONS", iterations)?;
        }
        if let Some(parallelism) = env_var("PASSWORD_HASH_PARALLELISM") {
            self.auth.hash_parallelism = parse_value("PASSWORD_HASH_PARALLELISM", parallelism)?;
        }

        // Rate limiting
        if let Some(enabled) = env_var("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = parse_bool("RATE_LIMIT_ENABLED", enabled)?;
        }
        if let Some(max) = env_var("RATE_LIMIT_MAX_REQUESTS") {
            self.rate_limit.max_requests = parse_value("RATE_LIMIT_MAX_REQUESTS", max)?;
        }
        if let Some(window) = env_var("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = parse_value("RATE_LIMIT_WINDOW_SECS", window)?;
        }

        // Scheduler
        if let Some(enabled) = env_var("SCHEDULER_ENABLED") {
            self.scheduler.enabled = parse_bool("SCHEDULER_ENABLED", enabled)?;
        }
        if let Some(interval) = env_var("SCHEDULER_INTERVAL_SECS") {
            self.scheduler.interval_secs = parse_value("SCHEDULER_INTERVAL_SECS", interval)?;
        }

        // Logging
        if let Some(level) = env_var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = env_var("LOG_JSON") {
            self.logging.json_format = parse_bool("LOG_JSON", json)?;
        }
        if let Some(location) = env_var("LOG_INCLUDE_LOCATION") {
            self.logging.include_location = parse_bool("LOG_INCLUDE_LOCATION", location)?;
        }

        Ok(self)
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRATION_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        if self.rate_limit.enabled
            && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0)
        {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_MAX_REQUESTS/RATE_LIMIT_WINDOW_SECS".to_string(),
                value: format!(
                    "{}/{}",
                    self.rate_limit.max_requests, self.rate_limit.window_secs
                ),
            });
        }
        if self.scheduler.enabled && self.scheduler.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCHEDULER_INTERVAL_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn first_env<'a>(keys: &[&'a str]) -> Option<(&'a str, String)> {
    keys.iter()
        .find_map(|key| env_var(key).map(|value| (*key, value)))
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn parse_bool(key: &str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,

    /// Key rate limiting on X-Forwarded-For / X-Real-IP instead of the socket address
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 1024 * 1024, // 1MB
            // Empty by default for security - set via CORS_ORIGINS env var
            cors_origins: vec![],
            trust_proxy_headers: false,
        }
    }
}

/// Store implementation selected at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    SurrealDb,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "surrealdb" | "surreal" => Ok(Self::SurrealDb),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "STORE_BACKEND".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Store implementation
    pub backend: StoreBackend,

    /// SurrealDB WebSocket URL
    pub url: String,

    /// SurrealDB root username
    pub username: String,

    /// SurrealDB root password
    pub password: String,

    /// SurrealDB namespace
    pub namespace: String,

    /// SurrealDB database name
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::SurrealDb,
            url: "ws://localhost:8000".to_string(),
            username: "root".to_string(),
            password: "root".to_string(),
            namespace: "afl".to_string(),
            database: "affiliate".to_string(),
        }
    }
}

/// Token and password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for token signing. Required.
    pub jwt_secret: String,

    /// Access token lifetime in seconds (default: 3600 = 1 hour)
    pub token_ttl_secs: u64,

    /// Token issuer identifier
    pub issuer: String,

    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,

    /// Argon2 iterations
    pub hash_iterations: u32,

    /// Argon2 lanes
    pub hash_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 3600,
            issuer: "afl-api".to_string(),
            hash_memory_kib: 19456, // 19 MiB
            hash_iterations: 2,
            hash_parallelism: 1,
        }
    }
}

/// Fixed window rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Requests allowed per client per window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

/// Scheduled maintenance job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Seconds between runs (default: one day)
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 24 * 60 * 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or filter directives
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "afl_api=debug,afl_store=debug,tower_http=debug".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "test-secret".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_secs, 900);
        assert_eq!(config.scheduler.interval_secs, 86400);
        assert_eq!(config.database.backend, StoreBackend::SurrealDb);
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(
            "surrealdb".parse::<StoreBackend>().unwrap(),
            StoreBackend::SurrealDb
        );
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("mongodb".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = AppConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(key)) if key == "JWT_SECRET"
        ));

        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        let mut config = valid_config();
        config.rate_limit.window_secs = 0;
        assert!(config.validate().is_err());

        config.rate_limit.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_bool("X", "TRUE".to_string()).unwrap());
        assert!(!parse_bool("X", "off".to_string()).unwrap());
        assert!(parse_bool("X", "maybe".to_string()).is_err());

        let port: u16 = parse_value("PORT", " 5000 ".to_string()).unwrap();
        assert_eq!(port, 5000);
        assert!(parse_value::<u16>("PORT", "http".to_string()).is_err());

        assert_eq!(
            split_list("https://a.example, ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_from_file_partial() {
        let path = std::env::temp_dir().join(format!("afl-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
            [server]
            port = 9000

            [auth]
            jwt_secret = "from-file"

            [database]
            backend = "memory"
            "#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.jwt_secret, "from-file");
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.database.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_from_file_missing() {
        let result = AppConfig::from_file("/nonexistent/afl.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError { .. })));
    }
}
