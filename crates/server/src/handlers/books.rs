//! Best seller and book lookup handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, RawQuery, State};
use serde::Serialize;
use serde_json::Value;
use shelf_core::filter::is_valid_isbn;
use shelf_core::{FilterParams, ValidationErrors};
use shelf_metadata::models::BookRecord;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct BooksResponse<T> {
    pub success: bool,
    pub count: u64,
    pub data: Vec<T>,
}

/// GET /api/best-sellers - Query the best sellers history.
///
/// Query parameters: `author`, `title`, `isbn[]` and `offset`.
pub async fn best_sellers(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<BooksResponse<Value>>> {
    let filter = FilterParams::from_query(query.as_deref().unwrap_or_default()).validate()?;

    let report = state.books.fetch_best_sellers(&filter).await?;

    Ok(Json(BooksResponse {
        success: true,
        count: report.num_results,
        data: report.results,
    }))
}

/// GET /api/books/isbn/{isbn} - Stored books carrying an ISBN.
pub async fn books_by_isbn(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> ApiResult<Json<BooksResponse<BookRecord>>> {
    if !is_valid_isbn(&isbn) {
        let mut errors = ValidationErrors::default();
        errors.add("isbn", "The isbn field format is invalid.");
        return Err(ApiError::Validation(errors));
    }

    let books = state.books.find_by_isbn(&isbn).await?;

    Ok(Json(BooksResponse {
        success: true,
        count: books.len() as u64,
        data: books,
    }))
}
