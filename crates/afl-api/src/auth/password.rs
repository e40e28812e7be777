//! Password hashing and verification using Argon2id
//!
//! - Algorithm: Argon2id v19
//! - Cost: memory, iterations and lanes come from `AuthConfig`
//! - Salt: random per hash, embedded in the PHC string
//!
//! Hashing is CPU bound, so the async entry points run it on the blocking
//! thread pool.
//!
//! Author: hephaex@gmail.com

use afl_core::AuthConfig;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}

/// Password hashing configuration
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism (lanes)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            memory_cost: config.hash_memory_kib,
            time_cost: config.hash_iterations,
            parallelism: config.hash_parallelism,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    /// Create Argon2 parameters from this configuration
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordError> {
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            self.to_params()?,
        ))
    }
}

/// Hash a password with the given configuration
///
/// Returns a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
/// that carries everything needed for verification.
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = config
        .argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(PasswordError::InvalidHashFormat)` - Stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Parameters are read from the hash itself
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Async password hasher
#[derive(Debug, Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    /// Fails if the Argon2 parameters are out of range
    pub fn new(config: PasswordConfig) -> Result<Self, PasswordError> {
        config.to_params()?;
        Ok(Self { config })
    }

    /// Salted one-way hash; the same input never yields the same output
    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
            .await
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
    }

    /// `true` only when `password` matches `hash`. A malformed hash is a mismatch.
    pub async fn verify(&self, password: &str, hash: &str) -> bool {
        let password = password.to_owned();
        let hash = hash.to_owned();

        let outcome = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await;

        match outcome {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Stored password hash could not be verified");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}
