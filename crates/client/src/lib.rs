//! Outbound HTTP for the shelf best-sellers cache.
//!
//! [`HttpClient`] is a small reusable transport: base URL joining, API-key
//! parameter injection, default headers, a request timeout and a bounded
//! retry loop with a fixed delay. [`NytClient`] puts the best sellers
//! history endpoint behind the [`BestSellersSource`] trait.

pub mod error;
pub mod http;
pub mod source;

pub use error::TransportError;
pub use http::{HttpClient, HttpClientBuilder, UpstreamResponse};
pub use source::{BestSellersSource, NytClient};
