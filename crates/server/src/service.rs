//! Fetch-or-serve orchestration for best seller queries.
//!
//! A query either comes back from the store (when `serve_from_store` is on
//! and something matches) or goes to the upstream. Every upstream record is
//! normalized and stored on its own; one bad record never fails the call.

use crate::metrics;
use serde::Serialize;
use serde_json::Value;
use shelf_client::BestSellersSource;
use shelf_core::{Filter, HistoryPayload, PAGE_SIZE, UpstreamBook, UpstreamQuery};
use shelf_metadata::models::BookRecord;
use shelf_metadata::{MetadataError, MetadataStore, StoredBook};
use std::sync::Arc;
use uuid::Uuid;

/// What happened to one upstream record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Stored { book_id: Uuid },
    Skipped { reason: String },
}

/// Successful answer to a best seller query.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    /// Upstream `num_results`, or the number of records returned.
    pub num_results: u64,
    /// Records as they will be returned to the caller.
    pub results: Vec<Value>,
    /// One entry per upstream record, in order. Empty when served from the store.
    pub outcomes: Vec<RecordOutcome>,
    pub from_store: bool,
}

impl FetchReport {
    pub fn stored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Stored { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.stored()
    }
}

/// Caller-facing failure of a best seller query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The upstream answered with a failure status after all retries.
    #[error("Failed to fetch data from NYT API")]
    Upstream { code: u16 },

    /// Anything else went wrong; `code` is the fault's code (0 when it has none).
    #[error("An unexpected error occurred")]
    Unexpected { code: u16 },

    /// The upstream answered successfully without a `results` list.
    #[error("Malformed response from NYT API")]
    Malformed,
}

/// Failure value in the `{status, message, code}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResult {
    pub status: &'static str,
    pub message: String,
    pub code: u16,
}

impl FetchError {
    pub fn code(&self) -> u16 {
        match self {
            Self::Upstream { code } | Self::Unexpected { code } => *code,
            Self::Malformed => 502,
        }
    }

    pub fn to_result(&self) -> ErrorResult {
        ErrorResult {
            status: "error",
            message: self.to_string(),
            code: self.code(),
        }
    }
}

/// Why a single record was not stored.
#[derive(Debug, thiserror::Error)]
enum IngestError {
    #[error(transparent)]
    Record(#[from] shelf_core::Error),

    #[error(transparent)]
    Store(#[from] MetadataError),
}

/// Coordinates the upstream source and the catalog store.
#[derive(Clone)]
pub struct BookService {
    source: Arc<dyn BestSellersSource>,
    store: Arc<dyn MetadataStore>,
    serve_from_store: bool,
}

impl BookService {
    pub fn new(source: Arc<dyn BestSellersSource>, store: Arc<dyn MetadataStore>) -> Self {
        Self {
            source,
            store,
            serve_from_store: false,
        }
    }

    /// Answer from stored records first when any match the filter.
    pub fn with_serve_from_store(mut self, enabled: bool) -> Self {
        self.serve_from_store = enabled;
        self
    }

    /// Run a best seller query.
    pub async fn fetch_best_sellers(&self, filter: &Filter) -> Result<FetchReport, FetchError> {
        if self.serve_from_store
            && let Some(report) = self.serve_stored(filter).await?
        {
            return Ok(report);
        }

        let query = UpstreamQuery::from_filter(filter);
        let timer = metrics::UPSTREAM_FETCH_DURATION.start_timer();
        let result = self.source.history(&query).await;
        timer.observe_duration();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream_request("fault");
                tracing::error!(error = %e, code = e.code(), "Unexpected error in NYT API service");
                return Err(FetchError::Unexpected { code: e.code() });
            }
        };

        if response.failed() {
            metrics::record_upstream_request("failed");
            tracing::error!(
                status = response.status,
                body = %response.body,
                "NYT API request failed"
            );
            return Err(FetchError::Upstream {
                code: response.status,
            });
        }
        metrics::record_upstream_request("success");

        let payload = response
            .json::<Value>()
            .ok()
            .and_then(HistoryPayload::from_value)
            .ok_or_else(|| {
                tracing::error!(
                    status = response.status,
                    body = %response.body,
                    "NYT API response has no results list"
                );
                FetchError::Malformed
            })?;

        let outcomes = self.ingest(&payload.results).await;
        let report = FetchReport {
            num_results: payload.count(),
            results: payload.results,
            outcomes,
            from_store: false,
        };
        tracing::info!(
            num_results = report.num_results,
            stored = report.stored(),
            skipped = report.skipped(),
            "Best sellers fetched from upstream"
        );
        Ok(report)
    }

    /// All stored books carrying `isbn` as an ISBN-10 or ISBN-13.
    pub async fn find_by_isbn(&self, isbn: &str) -> Result<Vec<BookRecord>, MetadataError> {
        self.store.find_books_by_isbn(isbn).await
    }

    async fn serve_stored(&self, filter: &Filter) -> Result<Option<FetchReport>, FetchError> {
        let records = match self.store.search_books(filter, PAGE_SIZE).await {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "Store lookup failed, asking the upstream instead");
                return Ok(None);
            }
        };

        let results = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to encode stored records");
                FetchError::Unexpected { code: 0 }
            })?;

        metrics::SERVED_FROM_STORE.inc();
        tracing::debug!(count = results.len(), "Best sellers served from store");
        Ok(Some(FetchReport {
            num_results: results.len() as u64,
            results,
            outcomes: Vec::new(),
            from_store: true,
        }))
    }

    /// Normalize and store each record independently.
    async fn ingest(&self, results: &[Value]) -> Vec<RecordOutcome> {
        let mut outcomes = Vec::with_capacity(results.len());
        for record in results {
            let outcome = match self.store_record(record).await {
                Ok(stored) => {
                    metrics::RECORDS_STORED.inc();
                    tracing::debug!(
                        book_id = %stored.book_id,
                        identifiers = stored.identifiers,
                        ranks = stored.ranks,
                        reviews = stored.reviews,
                        "Stored book data"
                    );
                    RecordOutcome::Stored {
                        book_id: stored.book_id,
                    }
                }
                Err(e) => {
                    metrics::RECORDS_SKIPPED.inc();
                    tracing::error!(error = %e, data = %record, "Failed to store book data");
                    RecordOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn store_record(&self, record: &Value) -> Result<StoredBook, IngestError> {
        let entry = UpstreamBook::from_value(record)?.into_entry()?;
        Ok(self.store.store_book(&entry).await?)
    }
}
