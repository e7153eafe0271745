//! ArangoDB REST client bound to one database.

use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use super::aql::{self, AqlQuery};
use crate::core::config::ArangoConfig;
use crate::domains::backends::http::{
    ApiCall, HttpRequest, HttpTransport, basic_auth_header, join_url, parse_base_url,
};
use crate::domains::tools::{ToolError, ToolResult};

const BACKEND: &str = "ArangoDB";

pub struct ArangoClient {
    base: Url,
    database: String,
    auth: Option<String>,
    transport: Arc<dyn HttpTransport>,
}

impl ArangoClient {
    pub fn new(
        config: &ArangoConfig,
        database: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> ToolResult<Self> {
        Ok(Self {
            base: parse_base_url(&config.url)?,
            database: database.to_string(),
            auth: basic_auth_header(&config.username, &config.password),
            transport,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn request_for(&self, call: &ApiCall) -> ToolResult<HttpRequest> {
        let mut segments = vec!["_db".to_string(), self.database.clone()];
        segments.extend(call.segments.iter().cloned());
        let url = join_url(&self.base, &segments, &call.query)?;

        let request = HttpRequest::new(call.method.clone(), url)
            .header("Accept", "application/json")
            .basic_auth(self.auth.as_deref());
        Ok(match &call.body {
            Some(body) => request.json_body(body),
            None => request,
        })
    }

    /// Execute a call and return the decoded JSON body.
    pub async fn call(&self, call: ApiCall) -> ToolResult<Value> {
        let request = self.request_for(&call)?;
        debug!("ArangoDB {} {}", request.method, request.url.path());

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ToolError::backend(BACKEND, e.to_string()))?;
        let body = response.json();

        if !response.is_success() {
            let message = body
                .as_ref()
                .and_then(|b| b.get("errorMessage"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} {}", response.status, response.status_text));
            warn!("ArangoDB request failed: {}", message);
            return Err(ToolError::backend(BACKEND, message));
        }

        body.ok_or_else(|| ToolError::backend(BACKEND, "response is not JSON"))
    }

    /// Server version; doubles as the connectivity probe.
    pub async fn version(&self) -> ToolResult<Value> {
        self.call(ApiCall::get(&["_api", "version"])).await
    }

    /// Run a query and drain every cursor batch.
    pub async fn query_all(&self, query: &AqlQuery) -> ToolResult<Vec<Value>> {
        let mut batch = self.call(query.cursor_call()).await?;
        let mut results = Vec::new();

        loop {
            if let Some(Value::Array(items)) = batch.get_mut("result").map(Value::take) {
                results.extend(items);
            }

            let has_more = batch.get("hasMore").and_then(Value::as_bool).unwrap_or(false);
            let cursor_id = batch.get("id").and_then(Value::as_str).map(str::to_string);
            match (has_more, cursor_id) {
                (true, Some(id)) => batch = self.call(aql::next_batch(&id)).await?,
                _ => break,
            }
        }

        Ok(results)
    }
}
