//! JWT token issuance and verification
//!
//! Access tokens are HMAC-SHA256 signed and carry the user id and role.
//! They are stateless: validity is signature plus expiry, nothing is stored
//! server side and there is no revocation.
//!
//! Author: hephaex@gmail.com

use afl_core::{AuthConfig, UserRole};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// User's role
    pub role: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// Identity embedded in and recovered from a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// JWT token generation and validation errors
///
/// The variants are kept apart for logging only; callers outside the auth
/// module treat every verification failure the same way.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),

    #[error("Token lifetime of {0}s overflows the expiry timestamp")]
    LifetimeOverflow(u64),
}

/// JWT Configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Access token expiration time in seconds (default: 3600 = 1 hour)
    pub access_expiration_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            access_expiration_secs: config.token_ttl_secs,
            issuer: config.issuer.clone(),
        }
    }
}

/// Signs and verifies access tokens with a server-held secret
#[derive(Clone)]
pub struct TokenService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Issue an access token valid for the configured lifetime
    pub fn issue(&self, identity: &Identity) -> Result<String, JwtError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        self.issue_at(identity, now)
    }

    /// Issue a token as if it had been created at `issued_at` (Unix seconds)
    pub fn issue_at(&self, identity: &Identity, issued_at: u64) -> Result<String, JwtError> {
        let claims = Claims {
            iss: self.config.issuer.clone(),
            sub: identity.user_id.to_string(),
            role: identity.role.as_str().to_string(),
            iat: issued_at,
            exp: issued_at
                .checked_add(self.config.access_expiration_secs)
                .ok_or(JwtError::LifetimeOverflow(self.config.access_expiration_secs))?,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and recover its identity
    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            })?;

        let claims = token_data.claims;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)?;
        let role = claims.role.parse().map_err(|_| JwtError::InvalidToken)?;

        Ok(Identity { user_id, role })
    }
}
