//! Transport faults.

use thiserror::Error;

/// A request that could not produce an upstream response.
///
/// A response with a failure status is not a fault; it is returned as an
/// [`UpstreamResponse`](crate::UpstreamResponse) unless the client was built
/// with `throw_on_failure`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON in response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request to {url} failed with status {status} after retries")]
    Exhausted { url: String, status: u16, body: String },
}

impl TransportError {
    /// Numeric fault code: the HTTP status when the fault carries one, else 0.
    pub fn code(&self) -> u16 {
        match self {
            Self::Exhausted { status, .. } => *status,
            Self::Request { source, .. } | Self::Body { source, .. } => {
                source.status().map(|s| s.as_u16()).unwrap_or(0)
            }
            Self::InvalidUrl { .. } | Self::Build(_) | Self::Decode(_) => 0,
        }
    }
}
