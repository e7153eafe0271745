//! Shared HTTP plumbing for the REST-backed adapters.
//!
//! Adapters describe requests as [`HttpRequest`] values and send them through
//! an [`HttpTransport`]. The production transport wraps one `reqwest::Client`
//! per backend; tests substitute a recording fake.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Method, Url};
use serde_json::Value;
use thiserror::Error;

use crate::domains::tools::{ToolError, ToolResult};

/// A transport-level failure (connection refused, TLS, body read...).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HttpError(pub String);

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Attach a JSON body and the matching content type.
    pub fn json_body(self, body: &Value) -> Self {
        let mut request = self.header("Content-Type", "application/json");
        request.body = Some(body.to_string());
        request
    }

    /// Attach a form-encoded body.
    pub fn form_body(self, form: String) -> Self {
        let mut request = self.header("Content-Type", "application/x-www-form-urlencoded");
        request.body = Some(form);
        request
    }

    /// Add an `Authorization` header when credentials are present.
    pub fn basic_auth(self, auth: Option<&str>) -> Self {
        match auth {
            Some(value) => self.header("Authorization", value),
            None => self,
        }
    }
}

/// A backend call described relative to the backend's base URL.
///
/// This is what the REST builders produce; the backend client resolves it
/// into an [`HttpRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiCall {
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post(segments: &[&str], body: Value) -> Self {
        Self::new(Method::POST, segments).with_body(body)
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Query parameter value, for assertions and logging.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path relative to the base, e.g. `/db/_find`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// A received response, fully read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body decoded as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> ToolResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ToolError::config(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body,
        })
    }
}

/// Where an adapter gets its transport from when its handle is built.
#[derive(Clone)]
pub enum TransportSource {
    /// Build a fresh `reqwest` client.
    Reqwest,
    /// Reuse a supplied transport.
    Fixed(Arc<dyn HttpTransport>),
}

impl TransportSource {
    pub fn open(&self) -> ToolResult<Arc<dyn HttpTransport>> {
        match self {
            Self::Reqwest => Ok(Arc::new(ReqwestTransport::new()?)),
            Self::Fixed(transport) => Ok(transport.clone()),
        }
    }
}

/// `Basic` authorization header value, when both parts are non-empty.
pub fn basic_auth_header(username: &str, password: &str) -> Option<String> {
    if username.is_empty() || password.is_empty() {
        return None;
    }
    let credentials = STANDARD.encode(format!("{}:{}", username, password));
    Some(format!("Basic {}", credentials))
}

/// Parse a configured base URL.
pub fn parse_base_url(raw: &str) -> ToolResult<Url> {
    Url::parse(raw).map_err(|e| ToolError::config(format!("invalid URL '{}': {}", raw, e)))
}

/// Append percent-encoded path segments and query pairs to `base`.
pub fn join_url(base: &Url, segments: &[String], query: &[(String, String)]) -> ToolResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ToolError::config(format!("URL cannot be a base: {}", base)))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}
