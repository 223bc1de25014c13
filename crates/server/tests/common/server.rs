//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use shelf_client::{BestSellersSource, NytClient};
use shelf_core::config::{AppConfig, MetadataConfig};
use shelf_metadata::{MetadataStore, SqliteStore};
use shelf_server::{AppState, create_router};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Test server talking to a real upstream at `base_url` (usually httpmock).
    pub async fn new(base_url: &str) -> Self {
        Self::with_config(base_url, |_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(base_url: &str, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = AppConfig::for_testing(base_url);
        modifier(&mut config);
        let source: Arc<dyn BestSellersSource> = Arc::new(
            NytClient::from_config(&config.upstream).expect("Failed to build upstream client"),
        );
        Self::build(config, source).await
    }

    /// Test server backed by a stub source.
    pub async fn with_source(source: Arc<dyn BestSellersSource>) -> Self {
        Self::build(AppConfig::for_testing("http://upstream.invalid"), source).await
    }

    async fn build(mut config: AppConfig, source: Arc<dyn BestSellersSource>) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let db_path = temp_dir.path().join("shelf.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path, None)
                .await
                .expect("Failed to create metadata store"),
        );
        config.metadata = MetadataConfig::Sqlite {
            path: db_path,
            query_timeout_secs: None,
        };

        shelf_server::metrics::register_metrics();

        let state = AppState::new(config, source, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// GET `uri` and decode the JSON body (Null when empty or not JSON).
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}
