//! Caller filters for the best sellers list and their validation.
//!
//! `FilterParams` is the raw inbound form (everything still a string),
//! `Filter` is what the rest of the system consumes. The only way from one
//! to the other at the HTTP boundary is [`FilterParams::validate`].

use crate::PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum length (in characters) of the author and title filters.
pub const MAX_TEXT_LEN: usize = 255;

/// Validated search criteria for the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub author: Option<String>,
    pub title: Option<String>,
    /// ISBNs in caller order; duplicates are kept.
    pub isbns: Option<Vec<String>>,
    /// Always a multiple of [`PAGE_SIZE`].
    pub offset: Option<u32>,
}

impl Filter {
    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.title.is_none() && self.isbns.is_none() && self.offset.is_none()
    }
}

/// Raw query parameters as received from the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterParams {
    pub author: Option<String>,
    pub title: Option<String>,
    pub isbn: Option<Vec<String>>,
    pub offset: Option<String>,
}

impl FilterParams {
    /// Parse a raw (percent-encoded) query string.
    ///
    /// ISBNs may be sent as `isbn[]=a&isbn[]=b`, `isbn[0]=a` or repeated
    /// `isbn=a`. Unknown keys are ignored and empty values count as absent,
    /// except empty `isbn[]` elements, which are kept and fail validation.
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Build from already-decoded key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value: String = value.into();
            let key = key.as_ref();
            // List elements keep their position so `isbn.N` errors line up.
            if value.is_empty() && (key == "isbn" || !is_isbn_key(key)) {
                continue;
            }
            match key {
                "author" => params.author = Some(value),
                "title" => params.title = Some(value),
                "offset" => params.offset = Some(value),
                key if is_isbn_key(key) => params.isbn.get_or_insert_with(Vec::new).push(value),
                _ => {}
            }
        }
        params
    }

    /// Apply the inbound rules and produce a [`Filter`].
    pub fn validate(self) -> Result<Filter, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        for (field, value) in [("author", &self.author), ("title", &self.title)] {
            if let Some(value) = value
                && value.chars().count() > MAX_TEXT_LEN
            {
                errors.add(
                    field,
                    format!("The {field} field must not be greater than {MAX_TEXT_LEN} characters."),
                );
            }
        }

        if let Some(isbns) = &self.isbn {
            for (index, isbn) in isbns.iter().enumerate() {
                if !is_valid_isbn(isbn) {
                    let field = format!("isbn.{index}");
                    let message = format!("The {field} field format is invalid.");
                    errors.add(field, message);
                }
            }
        }

        let offset = match self.offset.as_deref().map(parse_offset) {
            None => None,
            Some(Ok(offset)) => Some(offset),
            Some(Err(message)) => {
                errors.add("offset", message);
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Filter {
            author: self.author,
            title: self.title,
            isbns: self.isbn,
            offset,
        })
    }
}

fn is_isbn_key(key: &str) -> bool {
    match key.strip_prefix("isbn") {
        Some("") | Some("[]") => true,
        Some(rest) => rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

/// `^[0-9X]{10,13}$`
pub fn is_valid_isbn(value: &str) -> bool {
    (10..=13).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit() || b == b'X')
}

fn parse_offset(raw: &str) -> Result<u32, String> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| "The offset field must be an integer.".to_string())?;
    if value < 0 {
        return Err("The offset field must be at least 0.".to_string());
    }
    if value % i64::from(PAGE_SIZE) != 0 {
        return Err(format!("The offset field must be a multiple of {PAGE_SIZE}."));
    }
    u32::try_from(value).map_err(|_| "The offset field is too large.".to_string())
}

/// Field-level validation failures, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}
