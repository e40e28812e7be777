//! Authentication service layer
//!
//! Register and login flows on top of the store, the password hasher and
//! the token service.

use super::jwt::{Identity, TokenService};
use super::password::PasswordService;
use crate::error::AppError;
use crate::validation::{FieldRules, Validated, LOGIN_RULES, REGISTER_RULES};
use afl_core::{normalize_email, AflError, Store, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use utoipa::ToSchema;

pub const USER_EXISTS_MESSAGE: &str = "User already exists";

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// At least 6 characters
    #[schema(example = "secret1")]
    pub password: String,
}

impl Validated for RegisterRequest {
    const RULES: &'static [FieldRules] = REGISTER_RULES;
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "secret1")]
    pub password: String,
}

impl Validated for LoginRequest {
    const RULES: &'static [FieldRules] = LOGIN_RULES;
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token, valid for one hour
    pub token: String,
}

/// Authentication service
pub struct AuthService {
    store: Arc<dyn Store>,
    passwords: PasswordService,
    tokens: TokenService,
    /// Verified against when the email is unknown, so both login failures cost one hash
    decoy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, passwords: PasswordService, tokens: TokenService) -> Self {
        Self {
            store,
            passwords,
            tokens,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Register a new user with the default role
    ///
    /// Fails with `Conflict` when the email is already registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        let email = normalize_email(&request.email);

        if self.store.find_user_by_email(&email).await?.is_some() {
            tracing::info!(email = %email, "Registration rejected: email already registered");
            return Err(AppError::Conflict(USER_EXISTS_MESSAGE.to_string()));
        }

        let password_hash = self.passwords.hash(&request.password).await?;
        let user = User::new(request.name, &email, password_hash);

        match self.store.create_user(&user).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration
            Err(AflError::Duplicate(_)) => {
                return Err(AppError::Conflict(USER_EXISTS_MESSAGE.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and issue an access token
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let email = normalize_email(&request.email);

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            let decoy = self
                .decoy_hash
                .get_or_try_init(|| self.passwords.hash("decoy-password"))
                .await?;
            self.passwords.verify(&request.password, decoy).await;
            tracing::info!("Login failed: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self.passwords.verify(&request.password, &user.password_hash).await {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(&Identity {
            user_id: user.id,
            role: user.role,
        })?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse { token })
    }
}
