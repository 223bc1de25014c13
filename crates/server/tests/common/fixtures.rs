//! Test fixtures: upstream payloads and stub sources.

use async_trait::async_trait;
use serde_json::{Value, json};
use shelf_client::{BestSellersSource, TransportError, UpstreamResponse};
use shelf_core::UpstreamQuery;
use std::net::TcpListener;

/// Upstream path the NYT client requests.
#[allow(dead_code)]
pub const HISTORY_PATH: &str = "/books/v3/lists/best-sellers/history.json";

/// Whether httpmock can start a server in this environment.
#[allow(dead_code)]
pub fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

/// The smallest record the normalizer accepts with children.
#[allow(dead_code)]
pub fn minimal_record() -> Value {
    json!({
        "title": "T",
        "author": "A",
        "isbns": [{"isbn10": "123"}],
        "ranks_history": [{"rank": 1, "list_name": "L"}],
        "reviews": []
    })
}

/// A fuller record, shaped like the real upstream.
#[allow(dead_code)]
pub fn full_record(title: &str, author: &str, isbn10: &str, isbn13: &str) -> Value {
    json!({
        "title": title,
        "description": "A story",
        "contributor": format!("by {author}"),
        "author": author,
        "contributor_note": "",
        "price": "0.00",
        "age_group": "",
        "publisher": "Pub",
        "isbns": [{"isbn10": isbn10, "isbn13": isbn13}],
        "ranks_history": [{
            "primary_isbn10": isbn10,
            "primary_isbn13": isbn13,
            "rank": 4,
            "list_name": "Hardcover Fiction",
            "display_name": "Hardcover Fiction",
            "published_date": "2024-01-07",
            "bestsellers_date": "2023-12-23",
            "weeks_on_list": 2,
            "ranks_last_week": null,
            "asterisk": 0,
            "dagger": 0
        }],
        "reviews": [{
            "book_review_link": "",
            "first_chapter_link": "",
            "sunday_review_link": "",
            "article_chapter_link": ""
        }]
    })
}

/// Success payload of the history endpoint.
#[allow(dead_code)]
pub fn history_body(results: Vec<Value>) -> Value {
    json!({
        "status": "OK",
        "copyright": "Copyright (c) 2024 The New York Times Company.  All Rights Reserved.",
        "num_results": results.len(),
        "results": results
    })
}

/// Source whose every request ends in a transport fault with the given code.
#[allow(dead_code)]
pub struct FaultySource {
    pub code: u16,
}

#[async_trait]
impl BestSellersSource for FaultySource {
    async fn history(&self, _query: &UpstreamQuery) -> Result<UpstreamResponse, TransportError> {
        Err(TransportError::Exhausted {
            url: format!("http://upstream.invalid{HISTORY_PATH}"),
            status: self.code,
            body: String::new(),
        })
    }
}

/// Source that always answers with the same response.
#[allow(dead_code)]
pub struct StaticSource {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
impl BestSellersSource for StaticSource {
    async fn history(&self, _query: &UpstreamQuery) -> Result<UpstreamResponse, TransportError> {
        Ok(UpstreamResponse {
            status: self.status,
            url: format!("http://upstream.invalid{HISTORY_PATH}"),
            body: self.body.to_string(),
        })
    }
}
