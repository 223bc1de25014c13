//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Answer best-seller queries from stored records when any match,
    /// before asking the upstream (default: false).
    #[serde(default)]
    pub serve_from_store: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
            serve_from_store: false,
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Query timeout in seconds (advisory only, SQLite cannot cancel queries).
        #[serde(default = "default_sqlite_query_timeout_secs")]
        query_timeout_secs: Option<u64>,
    },
}

fn default_sqlite_query_timeout_secs() -> Option<u64> {
    Some(600)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/shelf.db"),
            query_timeout_secs: default_sqlite_query_timeout_secs(),
        }
    }
}

/// Upstream (best sellers provider) client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL every request path is joined onto. Empty means paths are used verbatim.
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// API key injected into every request.
    /// WARNING: Prefer SHELF_UPSTREAM__API_KEY over storing the key in a config file.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Name of the parameter carrying the API key.
    #[serde(default = "default_api_key_param")]
    pub api_key_param: String,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts for a request whose response is a failure (non-2xx/3xx).
    #[serde(default = "default_retry_times")]
    pub retry_times: u32,
    /// Fixed delay between attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Report an exhausted retry loop as a fault instead of returning the
    /// last failed response (default: false).
    #[serde(default)]
    pub throw_on_failure: bool,
}

fn default_upstream_base_url() -> String {
    "https://api.nytimes.com/svc".to_string()
}

fn default_api_key_param() -> String {
    "api-key".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_times() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            api_key: None,
            api_key_param: default_api_key_param(),
            headers: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
            retry_times: default_retry_times(),
            retry_delay_ms: default_retry_delay_ms(),
            throw_on_failure: false,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Validate upstream configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_url.is_empty() {
            url::Url::parse(&self.base_url)
                .map_err(|e| format!("upstream.base_url is not a valid URL: {e}"))?;
        }
        if self.api_key_param.trim().is_empty() {
            return Err("upstream.api_key_param must not be empty".to_string());
        }
        if self.retry_times == 0 {
            return Err("upstream.retry_times must be at least 1".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("upstream.timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Upstream provider configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Points the upstream at `base_url` with a dummy key
    /// and no retry delay.
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            server: ServerConfig::default(),
            metadata: MetadataConfig::default(),
            upstream: UpstreamConfig {
                base_url: base_url.to_string(),
                api_key: Some("test-api-key".to_string()),
                retry_delay_ms: 0,
                ..UpstreamConfig::default()
            },
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.upstream.validate()
    }
}
