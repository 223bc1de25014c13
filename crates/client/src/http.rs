//! Reusable outbound HTTP client with API-key injection and bounded retry.

use crate::error::TransportError;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shelf_core::config::UpstreamConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

const DEFAULT_API_KEY_PARAM: &str = "api-key";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_TIMES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);
const REDACTED: &str = "***";

/// Response as received from the upstream, after the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Request URL with the API key masked.
    pub url: String,
    pub body: String,
}

impl UpstreamResponse {
    /// 2xx.
    pub fn successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Anything outside 2xx/3xx.
    pub fn failed(&self) -> bool {
        !(200..400).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Builder for [`HttpClient`]. All settings are fixed once built.
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    base_url: String,
    api_key: Option<String>,
    api_key_param: String,
    headers: BTreeMap<String, String>,
    timeout: Duration,
    retry_times: u32,
    retry_delay: Duration,
    throw_on_failure: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            api_key_param: DEFAULT_API_KEY_PARAM.to_string(),
            headers: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_times: DEFAULT_RETRY_TIMES,
            retry_delay: DEFAULT_RETRY_DELAY,
            throw_on_failure: false,
        }
    }
}

impl HttpClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_key_param(mut self, name: impl Into<String>) -> Self {
        self.api_key_param = name.into();
        self
    }

    /// Add a header sent with every request. Later values for the same name win.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts for a failed response, and the fixed pause between them.
    pub fn retry(mut self, times: u32, delay: Duration) -> Self {
        self.retry_times = times;
        self.retry_delay = delay;
        self
    }

    pub fn throw_on_failure(mut self, enabled: bool) -> Self {
        self.throw_on_failure = enabled;
        self
    }

    pub fn build(self) -> Result<HttpClient, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Build(format!("invalid header name {name:?}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Build(format!("invalid value for header {name}: {e}")))?;
            headers.insert(header_name, header_value);
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(HttpClient {
            http,
            base_url: self.base_url,
            api_key: self.api_key.filter(|key| !key.is_empty()),
            api_key_param: self.api_key_param,
            retry_times: self.retry_times.max(1),
            retry_delay: self.retry_delay,
            throw_on_failure: self.throw_on_failure,
        })
    }
}

/// Outbound HTTP client.
///
/// Parameter mappings accept strings, numbers and booleans; nulls are
/// skipped and arrays become repeated `key[]` pairs.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_param: String,
    retry_times: u32,
    retry_delay: Duration,
    throw_on_failure: bool,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let mut builder = Self::builder()
            .base_url(&config.base_url)
            .api_key_param(&config.api_key_param)
            .timeout(config.timeout())
            .retry(config.retry_times, config.retry_delay())
            .throw_on_failure(config.throw_on_failure);
        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key);
        }
        for (name, value) in &config.headers {
            builder = builder.header(name, value);
        }
        builder.build()
    }

    pub async fn get(
        &self,
        path: &str,
        query: Map<String, Value>,
    ) -> Result<UpstreamResponse, TransportError> {
        self.send(Method::GET, path, query, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Map<String, Value>,
        query: Map<String, Value>,
    ) -> Result<UpstreamResponse, TransportError> {
        self.send(Method::POST, path, query, Some(body)).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Map<String, Value>,
        query: Map<String, Value>,
    ) -> Result<UpstreamResponse, TransportError> {
        self.send(Method::PUT, path, query, Some(body)).await
    }

    pub async fn delete(
        &self,
        path: &str,
        query: Map<String, Value>,
    ) -> Result<UpstreamResponse, TransportError> {
        self.send(Method::DELETE, path, query, None).await
    }

    /// Join the base URL and `path` with exactly one `/`.
    /// An empty base URL leaves `path` untouched.
    pub fn build_url(&self, path: &str) -> String {
        if self.base_url.is_empty() {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Add the API key unless the mapping already carries the key parameter.
    pub fn attach_api_key(&self, mut params: Map<String, Value>) -> Map<String, Value> {
        if let Some(api_key) = &self.api_key
            && params
                .get(&self.api_key_param)
                .is_none_or(Value::is_null)
        {
            params.insert(self.api_key_param.clone(), Value::String(api_key.clone()));
        }
        params
    }

    /// Full request URL for `path` with `query` (API key included).
    pub fn request_url(&self, path: &str, query: Map<String, Value>) -> Result<Url, TransportError> {
        let raw = self.build_url(path);
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        let mut pairs = Vec::new();
        for (key, value) in &self.attach_api_key(query) {
            flatten_param(key, value, &mut pairs);
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// `url` with the API key parameter masked, for logs and errors.
    pub fn redact_url(&self, url: &Url) -> String {
        if url.query().is_none() {
            return url.to_string();
        }
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| {
                if key == self.api_key_param.as_str() {
                    (key.into_owned(), REDACTED.to_string())
                } else {
                    (key.into_owned(), value.into_owned())
                }
            })
            .collect();
        let mut shown = url.clone();
        shown.query_pairs_mut().clear().extend_pairs(pairs);
        shown.to_string()
    }

    fn redact_params(&self, params: &Map<String, Value>) -> Map<String, Value> {
        let mut shown = params.clone();
        if let Some(value) = shown.get_mut(&self.api_key_param) {
            *value = Value::String(REDACTED.to_string());
        }
        shown
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Map<String, Value>,
        body: Option<Map<String, Value>>,
    ) -> Result<UpstreamResponse, TransportError> {
        let logged_params = Value::Object(self.redact_params(&query));
        let url = self.request_url(path, query).inspect_err(|e| {
            tracing::error!(
                method = %method,
                path = %path,
                params = %logged_params,
                error = %e,
                "HTTP request failed"
            );
        })?;
        let shown = self.redact_url(&url);
        let body = body.map(|body| self.attach_api_key(body));

        let mut attempt = 1;
        loop {
            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(|source| {
                let source = source.without_url();
                tracing::error!(method = %method, url = %shown, error = %source, "HTTP request failed");
                TransportError::Request {
                    url: shown.clone(),
                    source,
                }
            })?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|source| {
                let source = source.without_url();
                tracing::error!(method = %method, url = %shown, error = %source, "HTTP response body unreadable");
                TransportError::Body {
                    url: shown.clone(),
                    source,
                }
            })?;
            let response = UpstreamResponse {
                status,
                url: shown.clone(),
                body: text,
            };

            if !response.failed() {
                return Ok(response);
            }
            if attempt >= self.retry_times {
                tracing::debug!(method = %method, url = %shown, status, attempt, "retries exhausted");
                if self.throw_on_failure {
                    return Err(TransportError::Exhausted {
                        url: response.url,
                        status,
                        body: response.body,
                    });
                }
                return Ok(response);
            }

            tracing::debug!(
                method = %method,
                url = %shown,
                status,
                attempt,
                max_attempts = self.retry_times,
                "request failed, retrying"
            );
            tokio::time::sleep(self.retry_delay).await;
            attempt += 1;
        }
    }
}

/// Flatten one parameter into query pairs.
fn flatten_param(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => out.push((key.to_string(), if *flag { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key.to_string(), n.to_string())),
        Value::String(s) => out.push((key.to_string(), s.clone())),
        Value::Array(items) => {
            let key = format!("{key}[]");
            for item in items {
                flatten_param(&key, item, out);
            }
        }
        Value::Object(fields) => {
            for (field, item) in fields {
                flatten_param(&format!("{key}[{field}]"), item, out);
            }
        }
    }
}
