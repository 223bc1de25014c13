//! Catalog persistence for shelf.
//!
//! This crate owns the stored side of the cache:
//! - Book records and their ISBN numbers
//! - Append-only rank history and reviews
//! - Transactional ingestion of normalized upstream records
//! - Local search over stored records

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use repos::{BookRepo, StoredBook};
pub use store::{MetadataStore, SqliteStore};

use shelf_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite {
            path,
            query_timeout_secs,
        } => {
            let store = SqliteStore::new(path, *query_timeout_secs).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
