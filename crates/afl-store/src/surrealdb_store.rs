//! SurrealDB implementation of the document store
//!
//! Provides connection management, schema setup and the writes/lookups
//! needed by the API. Records are keyed `table:uuid`; the UUID is also kept
//! in a plain `uid` field so reads never need to decode record ids.
//!
//! Author: hephaex@gmail.com

use afl_core::{
    AffiliateLink, AffiliateLinkStore, AflError, DatabaseConfig, Platform, PlatformStore, Result,
    Store, User, UserRole, UserStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use uuid::Uuid;

const USERS: &str = "users";
const PLATFORMS: &str = "platforms";
const AFFILIATE_LINKS: &str = "affiliate_links";

/// SurrealDB document store
pub struct SurrealDbStore {
    client: Surreal<Client>,
}

impl SurrealDbStore {
    /// Create a new SurrealDB connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // The ws engine adds the scheme itself
        let url = config
            .url
            .strip_prefix("ws://")
            .or_else(|| config.url.strip_prefix("wss://"))
            .unwrap_or(&config.url);

        let client = Surreal::new::<Ws>(url)
            .await
            .map_err(|e| AflError::DatabaseError(format!("SurrealDB connection failed: {e}")))?;

        if !config.username.is_empty() {
            client
                .signin(Root {
                    username: &config.username,
                    password: &config.password,
                })
                .await
                .map_err(|e| AflError::DatabaseError(format!("SurrealDB auth failed: {e}")))?;
        }

        client
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| AflError::DatabaseError(format!("SurrealDB namespace error: {e}")))?;

        Ok(Self { client })
    }

    /// Define tables and indexes. Safe to run on every start.
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS users SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS users_email_unique ON TABLE users COLUMNS email UNIQUE;
                DEFINE TABLE IF NOT EXISTS platforms SCHEMALESS;
                DEFINE TABLE IF NOT EXISTS affiliate_links SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS affiliate_links_platform ON TABLE affiliate_links COLUMNS platform_id;
            "#,
            )
            .await
            .and_then(|response| response.check())
            .map_err(|e| AflError::DatabaseError(format!("Schema init failed: {e}")))?;

        Ok(())
    }

    async fn insert<T>(&self, table: &'static str, id: Uuid, record: T) -> surrealdb::Result<()>
    where
        T: Serialize + Send + 'static,
    {
        self.client
            .query("CREATE type::thing($table, $id) CONTENT $record RETURN NONE")
            .bind(("table", table))
            .bind(("id", id.to_string()))
            .bind(("record", record))
            .await?
            .check()?;
        Ok(())
    }
}

/// Unique index violations surface as plain query errors
fn is_unique_violation(err: &surrealdb::Error) -> bool {
    err.to_string().contains("already contains")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    uid: String,
    name: String,
    email: String,
    password_hash: String,
    role: UserRole,
    created_at: DateTime<Utc>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            uid: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = AflError;

    fn try_from(record: UserRecord) -> Result<Self> {
        let id = Uuid::parse_str(&record.uid)
            .map_err(|e| AflError::DatabaseError(format!("Corrupt user id {}: {e}", record.uid)))?;
        Ok(User {
            id,
            name: record.name,
            email: record.email,
            password_hash: record.password_hash,
            role: record.role,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct PlatformRecord {
    uid: String,
    name: String,
    description: String,
    niches: Vec<String>,
    commission_rate: f64,
    api_url: String,
    created_at: DateTime<Utc>,
}

impl From<&Platform> for PlatformRecord {
    fn from(platform: &Platform) -> Self {
        Self {
            uid: platform.id.to_string(),
            name: platform.name.clone(),
            description: platform.description.clone(),
            niches: platform.niches.clone(),
            commission_rate: platform.commission_rate,
            api_url: platform.api_url.clone(),
            created_at: platform.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct AffiliateLinkRecord {
    uid: String,
    url: String,
    platform_id: String,
    created_at: DateTime<Utc>,
}

impl From<&AffiliateLink> for AffiliateLinkRecord {
    fn from(link: &AffiliateLink) -> Self {
        Self {
            uid: link.id.to_string(),
            url: link.url.clone(),
            platform_id: link.platform_id.to_string(),
            created_at: link.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UidRow {
    #[allow(dead_code)]
    uid: String,
}

#[async_trait]
impl UserStore for SurrealDbStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        match self.insert(USERS, user.id, UserRecord::from(user)).await {
            Ok(()) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(AflError::Duplicate(format!("email {}", user.email)))
            }
            Err(e) => Err(AflError::DatabaseError(format!("Failed to store user: {e}"))),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let records: Vec<UserRecord> = self
            .client
            .query(
                "SELECT uid, name, email, password_hash, role, created_at \
                 FROM users WHERE email = $email LIMIT 1",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(|e| AflError::DatabaseError(format!("Query failed: {e}")))?
            .take(0)
            .map_err(|e| AflError::DatabaseError(format!("Result extraction failed: {e}")))?;

        records.into_iter().next().map(User::try_from).transpose()
    }
}

#[async_trait]
impl PlatformStore for SurrealDbStore {
    async fn create_platform(&self, platform: &Platform) -> Result<()> {
        self.insert(PLATFORMS, platform.id, PlatformRecord::from(platform))
            .await
            .map_err(|e| AflError::DatabaseError(format!("Failed to store platform: {e}")))
    }

    async fn platform_exists(&self, id: Uuid) -> Result<bool> {
        let rows: Vec<UidRow> = self
            .client
            .query("SELECT uid FROM type::thing($table, $id)")
            .bind(("table", PLATFORMS))
            .bind(("id", id.to_string()))
            .await
            .map_err(|e| AflError::DatabaseError(format!("Query failed: {e}")))?
            .take(0)
            .map_err(|e| AflError::DatabaseError(format!("Result extraction failed: {e}")))?;

        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl AffiliateLinkStore for SurrealDbStore {
    async fn create_affiliate_link(&self, link: &AffiliateLink) -> Result<()> {
        self.insert(AFFILIATE_LINKS, link.id, AffiliateLinkRecord::from(link))
            .await
            .map_err(|e| AflError::DatabaseError(format!("Failed to store affiliate link: {e}")))
    }
}

#[async_trait]
impl Store for SurrealDbStore {
    fn backend_name(&self) -> &'static str {
        "surrealdb"
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .health()
            .await
            .map_err(|e| AflError::DatabaseError(format!("SurrealDB health check failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afl_core::NewPlatform;

    fn test_config() -> DatabaseConfig {
        DatabaseConfig {
            namespace: "afl_test".to_string(),
            database: format!("t{}", Uuid::new_v4().simple()),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_record_round_trip() {
        let user = User::new("Ada", "ada@example.com", "hash");
        let restored = User::try_from(UserRecord::from(&user)).unwrap();
        assert_eq!(restored.id, user.id);
        assert_eq!(restored.email, user.email);
        assert_eq!(restored.role, UserRole::User);
    }

    #[test]
    fn test_corrupt_user_id_rejected() {
        let mut record = UserRecord::from(&User::new("Ada", "ada@example.com", "hash"));
        record.uid = "not-a-uuid".to_string();
        assert!(matches!(
            User::try_from(record),
            Err(AflError::DatabaseError(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_surrealdb_user_uniqueness() {
        let store = SurrealDbStore::new(&test_config()).await.unwrap();
        store.init_schema().await.unwrap();

        let user = User::new("Ada", "ada@example.com", "hash");
        store.create_user(&user).await.unwrap();

        let found = store
            .find_user_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);

        let duplicate = User::new("Ada 2", "ada@example.com", "hash");
        assert!(matches!(
            store.create_user(&duplicate).await,
            Err(AflError::Duplicate(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_surrealdb_platform_and_link() {
        let store = SurrealDbStore::new(&test_config()).await.unwrap();
        store.init_schema().await.unwrap();

        let platform = Platform::new(NewPlatform {
            name: "Shop".to_string(),
            niches: vec!["tech".to_string()],
            commission_rate: 7.5,
            ..Default::default()
        });
        store.create_platform(&platform).await.unwrap();
        assert!(store.platform_exists(platform.id).await.unwrap());
        assert!(!store.platform_exists(Uuid::new_v4()).await.unwrap());

        let link = AffiliateLink::new("https://example.com/p", platform.id).unwrap();
        store.create_affiliate_link(&link).await.unwrap();
        store.health_check().await.unwrap();
    }
}
