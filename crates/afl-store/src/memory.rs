//! In-memory store
//!
//! Same contract as the SurrealDB store, including email uniqueness.
//! Used by the API tests and by `STORE_BACKEND=memory`.

use afl_core::{
    AffiliateLink, AffiliateLinkStore, AflError, Platform, PlatformStore, Result, Store, User,
    UserStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Keyed by normalized email
    users: RwLock<HashMap<String, User>>,
    platforms: RwLock<HashMap<Uuid, Platform>>,
    links: RwLock<HashMap<Uuid, AffiliateLink>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn platform_count(&self) -> usize {
        self.platforms.read().await.len()
    }

    pub async fn link_count(&self) -> usize {
        self.links.read().await.len()
    }

    pub async fn get_link(&self, id: Uuid) -> Option<AffiliateLink> {
        self.links.read().await.get(&id).cloned()
    }

    pub async fn get_platform(&self, id: Uuid) -> Option<Platform> {
        self.platforms.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(AflError::Duplicate(format!("email {}", user.email)));
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }
}

#[async_trait]
impl PlatformStore for MemoryStore {
    async fn create_platform(&self, platform: &Platform) -> Result<()> {
        self.platforms
            .write()
            .await
            .insert(platform.id, platform.clone());
        Ok(())
    }

    async fn platform_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.platforms.read().await.contains_key(&id))
    }
}

#[async_trait]
impl AffiliateLinkStore for MemoryStore {
    async fn create_affiliate_link(&self, link: &AffiliateLink) -> Result<()> {
        self.links.write().await.insert(link.id, link.clone());
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
