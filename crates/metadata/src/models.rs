//! Database models mapping to the catalog schema.

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Books
// =============================================================================

/// Stored best seller record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookRow {
    pub book_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub contributor: Option<String>,
    pub author: String,
    pub contributor_note: Option<String>,
    pub price: Option<f64>,
    pub publisher: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// External book number (ISBN-10 / ISBN-13) attached to a book.
/// Unique per (kind, number, book_id).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookNumberRow {
    pub id: i64,
    pub book_id: Uuid,
    pub kind: String,
    pub number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// History (append-only)
// =============================================================================

/// One appearance of a book on a best seller list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookRankRow {
    pub id: i64,
    pub book_id: Uuid,
    pub primary_isbn10: Option<String>,
    pub primary_isbn13: Option<String>,
    pub rank: Option<i64>,
    pub list_name: Option<String>,
    pub display_name: Option<String>,
    pub published_date: Option<String>,
    pub bestsellers_date: Option<String>,
    pub weeks_on_list: i64,
    pub ranks_last_week: Option<i64>,
    pub asterisk: bool,
    pub dagger: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookReviewRow {
    pub id: i64,
    pub book_id: Uuid,
    pub source: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub byline: Option<String>,
    pub publication_date: Option<String>,
    pub rating: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// Aggregates
// =============================================================================

/// A book together with all of its related rows.
#[derive(Debug, Clone, Serialize)]
pub struct BookRecord {
    #[serde(flatten)]
    pub book: BookRow,
    pub isbns: Vec<BookNumberRow>,
    pub ranks_history: Vec<BookRankRow>,
    pub reviews: Vec<BookReviewRow>,
}
