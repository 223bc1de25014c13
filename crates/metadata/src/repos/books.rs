//! Book repository trait.

use crate::error::MetadataResult;
use crate::models::BookRecord;
use async_trait::async_trait;
use shelf_core::{CatalogEntry, Filter};
use uuid::Uuid;

/// Summary of one committed ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredBook {
    pub book_id: Uuid,
    pub identifiers: usize,
    pub ranks: usize,
    pub reviews: usize,
}

/// Repository for stored best seller records.
#[async_trait]
pub trait BookRepo: Send + Sync {
    /// Insert a book with its numbers, ranks and reviews in one transaction.
    /// Nothing is written if any row fails; a duplicate book number is
    /// reported as `MetadataError::Constraint`.
    async fn store_book(&self, entry: &CatalogEntry) -> MetadataResult<StoredBook>;

    /// Get a book and its related rows by ID.
    async fn get_book(&self, book_id: Uuid) -> MetadataResult<Option<BookRecord>>;

    /// Search stored books: author/title substring match, ISBN match against
    /// stored numbers, filter offset, at most `limit` results.
    async fn search_books(&self, filter: &Filter, limit: u32) -> MetadataResult<Vec<BookRecord>>;

    /// All books carrying a number equal to `isbn` (any kind).
    async fn find_books_by_isbn(&self, isbn: &str) -> MetadataResult<Vec<BookRecord>>;

    /// Total number of stored books.
    async fn count_books(&self) -> MetadataResult<u64>;
}
