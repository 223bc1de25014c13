//! Core domain types and shared logic for the shelf best-sellers cache.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Caller filters and their validation
//! - Translation of filters into upstream query parameters
//! - Typed upstream records and their normalized catalog form
//! - Configuration shared by the server and its collaborators

pub mod config;
pub mod error;
pub mod filter;
pub mod query;
pub mod record;

pub use error::{Error, Result};
pub use filter::{Filter, FilterParams, ValidationErrors};
pub use query::UpstreamQuery;
pub use record::{
    CatalogEntry, HistoryPayload, IdentifierKind, NewBook, NewIdentifier, NewRank, NewReview,
    UpstreamBook,
};

/// Number of records per upstream page; offsets must be a multiple of it.
pub const PAGE_SIZE: u32 = 20;

/// Upstream path of the best sellers history list.
pub const BEST_SELLERS_HISTORY_PATH: &str = "/books/v3/lists/best-sellers/history.json";
