//! Upstream best seller records and their normalized catalog form.
//!
//! The upstream payload is loosely structured: any field may be missing or
//! null. [`UpstreamBook`] captures that with explicit `Option`s, and
//! [`UpstreamBook::into_entry`] is the single place where a record is checked
//! before anything is written.

use crate::error::{Error, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Longest identifier value the schema accepts.
pub const MAX_IDENTIFIER_LEN: usize = 20;

/// Success payload of the history endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryPayload {
    pub num_results: Option<u64>,
    /// Records exactly as the upstream sent them.
    pub results: Vec<Value>,
}

impl HistoryPayload {
    /// Returns `None` when `results` is missing or is not an array.
    pub fn from_value(mut value: Value) -> Option<Self> {
        let results = match value.get_mut("results").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => return None,
        };
        let num_results = value.get("num_results").and_then(Value::as_u64);
        Some(Self {
            num_results,
            results,
        })
    }

    /// Upstream `num_results`, falling back to the number of records received.
    pub fn count(&self) -> u64 {
        self.num_results.unwrap_or(self.results.len() as u64)
    }
}

/// One record from the upstream `results` list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamBook {
    pub title: Option<String>,
    pub description: Option<String>,
    pub contributor: Option<String>,
    pub author: Option<String>,
    pub contributor_note: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub isbns: Vec<UpstreamIsbn>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ranks_history: Vec<UpstreamRank>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reviews: Vec<UpstreamReview>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamIsbn {
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamRank {
    pub primary_isbn10: Option<String>,
    pub primary_isbn13: Option<String>,
    pub rank: Option<i64>,
    pub list_name: Option<String>,
    pub display_name: Option<String>,
    pub published_date: Option<String>,
    pub bestsellers_date: Option<String>,
    pub weeks_on_list: Option<i64>,
    #[serde(alias = "ranks_last_week")]
    pub rank_last_week: Option<i64>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub asterisk: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub dagger: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamReview {
    pub source: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub publication_date: Option<String>,
    pub byline: Option<String>,
    pub rating: Option<i64>,
}

impl UpstreamBook {
    /// Decode a raw upstream record.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| Error::InvalidRecord(e.to_string()))
    }

    /// Validate and flatten into the rows to persist.
    pub fn into_entry(self) -> Result<CatalogEntry> {
        let title = required(self.title, "title")?;
        let author = required(self.author, "author")?;

        let mut identifiers = Vec::new();
        for isbn in self.isbns {
            if let Some(value) = isbn.isbn10 {
                identifiers.push(NewIdentifier::new(IdentifierKind::Isbn10, value)?);
            }
            if let Some(value) = isbn.isbn13 {
                identifiers.push(NewIdentifier::new(IdentifierKind::Isbn13, value)?);
            }
        }

        let ranks = self
            .ranks_history
            .into_iter()
            .map(|r| NewRank {
                primary_isbn10: r.primary_isbn10,
                primary_isbn13: r.primary_isbn13,
                rank: r.rank,
                list_name: r.list_name,
                display_name: r.display_name,
                published_date: r.published_date,
                bestsellers_date: r.bestsellers_date,
                weeks_on_list: r.weeks_on_list.unwrap_or(0),
                rank_last_week: r.rank_last_week,
                asterisk: r.asterisk.unwrap_or(false),
                dagger: r.dagger.unwrap_or(false),
            })
            .collect();

        let reviews = self
            .reviews
            .into_iter()
            .map(|r| NewReview {
                source: r.source,
                summary: r.summary,
                url: r.url,
                byline: r.byline,
                publication_date: r.publication_date,
                rating: r.rating,
            })
            .collect();

        Ok(CatalogEntry {
            book: NewBook {
                title,
                description: self.description,
                contributor: self.contributor,
                author,
                contributor_note: self.contributor_note,
                price: self.price,
                publisher: self.publisher,
            },
            identifiers,
            ranks,
            reviews,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::InvalidRecord(format!("missing required field `{field}`"))),
    }
}

/// A catalog record plus its related rows, ready to be stored atomically.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub book: NewBook,
    pub identifiers: Vec<NewIdentifier>,
    pub ranks: Vec<NewRank>,
    pub reviews: Vec<NewReview>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub description: Option<String>,
    pub contributor: Option<String>,
    pub author: String,
    pub contributor_note: Option<String>,
    pub price: Option<f64>,
    pub publisher: Option<String>,
}

/// Kind of external book number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Isbn10,
    Isbn13,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Isbn10 => "isbn10",
            Self::Isbn13 => "isbn13",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewIdentifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl NewIdentifier {
    pub fn new(kind: IdentifierKind, value: String) -> Result<Self> {
        if value.len() > MAX_IDENTIFIER_LEN {
            return Err(Error::InvalidRecord(format!(
                "{kind} value exceeds {MAX_IDENTIFIER_LEN} characters: {value}"
            )));
        }
        Ok(Self { kind, value })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewRank {
    pub primary_isbn10: Option<String>,
    pub primary_isbn13: Option<String>,
    pub rank: Option<i64>,
    pub list_name: Option<String>,
    pub display_name: Option<String>,
    pub published_date: Option<String>,
    pub bestsellers_date: Option<String>,
    pub weeks_on_list: i64,
    pub rank_last_week: Option<i64>,
    pub asterisk: bool,
    pub dagger: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewReview {
    pub source: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub byline: Option<String>,
    pub publication_date: Option<String>,
    pub rating: Option<i64>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// The upstream sends prices both as numbers and as strings like `"0.00"`.
fn lenient_price<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid price: {s}"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrInt {
    Bool(bool),
    Int(i64),
}

/// Markers come as `0`/`1` from the upstream.
fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BoolOrInt>::deserialize(deserializer)?.map(|flag| match flag {
        BoolOrInt::Bool(b) => b,
        BoolOrInt::Int(n) => n != 0,
    }))
}
