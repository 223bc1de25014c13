//! Translation of a [`Filter`] into upstream query parameters.

use crate::filter::Filter;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Separator the upstream expects between ISBNs.
pub const ISBN_SEPARATOR: &str = ";";

/// Single query parameter value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Text(String),
    Int(u32),
}

impl QueryValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl From<QueryValue> for Value {
    fn from(value: QueryValue) -> Self {
        match value {
            QueryValue::Text(s) => Value::String(s),
            QueryValue::Int(n) => Value::from(n),
        }
    }
}

/// Query parameters sent to the upstream provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UpstreamQuery(BTreeMap<String, QueryValue>);

impl UpstreamQuery {
    /// Deterministic, I/O-free translation. Absent filter fields are omitted.
    pub fn from_filter(filter: &Filter) -> Self {
        let mut params = BTreeMap::new();

        if let Some(author) = &filter.author {
            params.insert("author".to_string(), QueryValue::Text(author.clone()));
        }

        if let Some(isbns) = &filter.isbns
            && !isbns.is_empty()
        {
            params.insert(
                "isbn".to_string(),
                QueryValue::Text(isbns.join(ISBN_SEPARATOR)),
            );
        }

        if let Some(title) = &filter.title {
            params.insert("title".to_string(), QueryValue::Text(title.clone()));
        }

        // Offset is already known to be a page multiple.
        if let Some(offset) = filter.offset {
            params.insert("offset".to_string(), QueryValue::Int(offset));
        }

        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Convert into the transport client's parameter mapping.
    pub fn into_params(self) -> Map<String, Value> {
        self.0.into_iter().map(|(k, v)| (k, v.into())).collect()
    }
}
