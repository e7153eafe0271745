//! CouchDB HTTP client.

use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::config::CouchDbConfig;
use crate::domains::backends::http::{
    ApiCall, HttpRequest, HttpResponse, HttpTransport, basic_auth_header, join_url, parse_base_url,
};
use crate::domains::tools::{ToolError, ToolResult};

const BACKEND: &str = "CouchDB";

pub struct CouchClient {
    base: Url,
    auth: Option<String>,
    transport: Arc<dyn HttpTransport>,
}

impl CouchClient {
    pub fn new(config: &CouchDbConfig, transport: Arc<dyn HttpTransport>) -> ToolResult<Self> {
        Ok(Self {
            base: parse_base_url(&config.url)?,
            auth: basic_auth_header(&config.username, &config.password),
            transport,
        })
    }

    /// Send a call; the body is decoded as JSON, or returned as a string.
    pub async fn request(&self, call: ApiCall) -> ToolResult<Value> {
        let url = join_url(&self.base, &call.segments, &call.query)?;
        debug!("CouchDB {} {}", call.method, url.path());

        let mut request = HttpRequest::new(call.method, url)
            .header("Accept", "application/json")
            .basic_auth(self.auth.as_deref());
        request = match &call.body {
            Some(body) => request.json_body(body),
            None => request.header("Content-Type", "application/json"),
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ToolError::backend(BACKEND, e.to_string()))?;
        let data = response.json();

        if !response.is_success() {
            let reason = error_reason(data.as_ref(), &response);
            warn!("CouchDB request failed: {}", reason);
            return Err(ToolError::backend(BACKEND, reason));
        }

        Ok(data.unwrap_or(Value::String(response.body)))
    }
}

/// `reason`, then `error`, then the raw body, then the status text.
fn error_reason(data: Option<&Value>, response: &HttpResponse) -> String {
    let field = |name: &str| {
        data.and_then(|d| d.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    field("reason")
        .or_else(|| field("error"))
        .or_else(|| Some(response.body.clone()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| response.status_text.clone())
}
