//! Application state shared across handlers.

use crate::service::BookService;
use shelf_client::BestSellersSource;
use shelf_core::config::AppConfig;
use shelf_metadata::MetadataStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Best seller orchestrator.
    pub books: BookService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Configuration is expected to be validated already.
    pub fn new(
        config: AppConfig,
        source: Arc<dyn BestSellersSource>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        if config.server.serve_from_store {
            tracing::info!("Serving best seller queries from stored records when they match");
        }
        let books = BookService::new(source, metadata.clone())
            .with_serve_from_store(config.server.serve_from_store);

        Self {
            config: Arc::new(config),
            metadata,
            books,
        }
    }
}
