//! Best sellers history source.

use crate::error::TransportError;
use crate::http::{HttpClient, UpstreamResponse};
use async_trait::async_trait;
use shelf_core::config::UpstreamConfig;
use shelf_core::{BEST_SELLERS_HISTORY_PATH, UpstreamQuery};

/// Where best seller history comes from.
#[async_trait]
pub trait BestSellersSource: Send + Sync {
    /// Fetch one page of the history list.
    async fn history(&self, query: &UpstreamQuery) -> Result<UpstreamResponse, TransportError>;
}

/// The NYT Books API.
#[derive(Clone)]
pub struct NytClient {
    http: HttpClient,
}

impl NytClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, TransportError> {
        Ok(Self::new(HttpClient::from_config(config)?))
    }
}

#[async_trait]
impl BestSellersSource for NytClient {
    async fn history(&self, query: &UpstreamQuery) -> Result<UpstreamResponse, TransportError> {
        self.http
            .get(BEST_SELLERS_HISTORY_PATH, query.clone().into_params())
            .await
    }
}
