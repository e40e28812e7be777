//! AFL Store - persistence backends
//!
//! Implements the `afl-core` store traits on top of:
//! - SurrealDB (production document store)
//! - an in-process map (tests and local development)

pub mod memory;
pub mod surrealdb_store;

pub use memory::MemoryStore;
pub use surrealdb_store::SurrealDbStore;

use afl_core::{DatabaseConfig, Result, Store, StoreBackend};
use std::sync::Arc;

/// Open the configured backend and prepare its schema
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Store>> {
    match config.backend {
        StoreBackend::SurrealDb => {
            let store = SurrealDbStore::new(config).await?;
            store.init_schema().await?;
            tracing::info!(url = %config.url, namespace = %config.namespace, "Connected to SurrealDB");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
