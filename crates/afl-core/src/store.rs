//! Async persistence traits
//!
//! Handlers only see these traits; `afl-store` provides the SurrealDB and
//! in-memory implementations.

use crate::models::{AffiliateLink, Platform, User};
use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user.
    ///
    /// Fails with [`crate::AflError::Duplicate`] when the email is already taken.
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Look up a user by normalized email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait PlatformStore: Send + Sync {
    async fn create_platform(&self, platform: &Platform) -> Result<()>;

    async fn platform_exists(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait AffiliateLinkStore: Send + Sync {
    async fn create_affiliate_link(&self, link: &AffiliateLink) -> Result<()>;
}

/// Full document store used by the API
#[async_trait]
pub trait Store: UserStore + PlatformStore + AffiliateLinkStore {
    /// Backend name for logs and health output
    fn backend_name(&self) -> &'static str;

    /// Cheap round trip to the backend
    async fn health_check(&self) -> Result<()>;
}
