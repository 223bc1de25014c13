//! HTTP API server for the shelf best-sellers cache.
//!
//! This crate provides:
//! - The fetch-or-serve orchestrator over the upstream and the catalog store
//! - Best seller, ISBN lookup and health endpoints
//! - Prometheus metrics

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod service;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use service::{BookService, FetchError, FetchReport, RecordOutcome};
pub use state::AppState;
