//! SPARQL protocol client.

use std::sync::Arc;

use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::sparql::SPARQL_RESULTS_JSON;
use crate::core::config::VirtuosoConfig;
use crate::domains::backends::http::{
    HttpRequest, HttpResponse, HttpTransport, basic_auth_header, parse_base_url,
};
use crate::domains::tools::{ToolError, ToolResult};

const QUERY_BACKEND: &str = "SPARQL";
const UPDATE_BACKEND: &str = "SPARQL Update";

pub struct VirtuosoClient {
    endpoint: Url,
    update_endpoint: Url,
    default_graph: Option<String>,
    auth: Option<String>,
    transport: Arc<dyn HttpTransport>,
}

impl VirtuosoClient {
    pub fn new(config: &VirtuosoConfig, transport: Arc<dyn HttpTransport>) -> ToolResult<Self> {
        Ok(Self {
            endpoint: parse_base_url(&config.endpoint)?,
            update_endpoint: parse_base_url(&config.update_endpoint)?,
            default_graph: Some(config.default_graph.clone()).filter(|g| !g.is_empty()),
            auth: basic_auth_header(&config.username, &config.password),
            transport,
        })
    }

    /// Run a query against the query endpoint.
    ///
    /// JSON responses are decoded; anything else (Turtle, RDF/XML...) comes
    /// back as a string value.
    pub async fn query(&self, query: &str, accept: &str) -> ToolResult<Value> {
        let mut form = vec![("query", query)];
        if let Some(graph) = &self.default_graph {
            form.push(("default-graph-uri", graph.as_str()));
        }
        debug!("SPARQL query ({} bytes, accept {})", query.len(), accept);

        let request = HttpRequest::new(Method::POST, self.endpoint.clone())
            .header("Accept", accept)
            .form_body(encode_form(&form, QUERY_BACKEND)?)
            .basic_auth(self.auth.as_deref());
        let response = self.send(request, QUERY_BACKEND).await?;

        if response.content_type.contains("json") {
            serde_json::from_str(&response.body)
                .map_err(|e| ToolError::backend(QUERY_BACKEND, format!("invalid JSON: {}", e)))
        } else {
            Ok(Value::String(response.body))
        }
    }

    /// Query with the SPARQL JSON results media type.
    pub async fn select(&self, query: &str) -> ToolResult<Value> {
        self.query(query, SPARQL_RESULTS_JSON).await
    }

    /// Run an update against the update endpoint, returning the response text.
    pub async fn update(&self, update: &str) -> ToolResult<String> {
        debug!("SPARQL update ({} bytes)", update.len());
        let request = HttpRequest::new(Method::POST, self.update_endpoint.clone())
            .form_body(encode_form(&[("query", update)], UPDATE_BACKEND)?)
            .basic_auth(self.auth.as_deref());
        Ok(self.send(request, UPDATE_BACKEND).await?.body)
    }

    async fn send(&self, request: HttpRequest, backend: &'static str) -> ToolResult<HttpResponse> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ToolError::backend(backend, e.to_string()))?;
        if !response.is_success() {
            warn!("{} request failed with status {}", backend, response.status);
            return Err(ToolError::backend(
                backend,
                format!("{} {}", response.status, response.body),
            ));
        }
        Ok(response)
    }
}

fn encode_form(pairs: &[(&str, &str)], backend: &'static str) -> ToolResult<String> {
    serde_urlencoded::to_string(pairs).map_err(|e| ToolError::backend(backend, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::backends::testing::RecordingTransport;
    use serde_json::json;

    fn client(transport: &Arc<RecordingTransport>, default_graph: &str) -> VirtuosoClient {
        let config = VirtuosoConfig {
            default_graph: default_graph.to_string(),
            ..VirtuosoConfig::default()
        };
        VirtuosoClient::new(&config, transport.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_query_form_carries_default_graph() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(200, json!({ "boolean": true }));

        let result = client(&transport, "http://example.org/g")
            .select("ASK { ?s ?p ?o }")
            .await
            .unwrap();

        assert_eq!(result, json!({ "boolean": true }));
        let request = &transport.requests()[0];
        assert_eq!(request.url.as_str(), "http://localhost:8890/sparql");
        assert_eq!(
            request.body.as_deref(),
            Some("query=ASK+%7B+%3Fs+%3Fp+%3Fo+%7D&default-graph-uri=http%3A%2F%2Fexample.org%2Fg")
        );
        assert!(
            request
                .headers
                .contains(&("Accept", SPARQL_RESULTS_JSON.to_string()))
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_text() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_text(200, "text/turtle", "<a> <b> <c> .");

        let result = client(&transport, "")
            .query("CONSTRUCT WHERE { ?s ?p ?o }", "text/turtle")
            .await
            .unwrap();
        assert_eq!(result, json!("<a> <b> <c> ."));
        assert!(!transport.requests()[0].body.as_deref().unwrap().contains("default-graph-uri"));
    }

    #[tokio::test]
    async fn test_update_errors_carry_status_and_body() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_text(401, "text/plain", "Unauthorized access");

        let err = client(&transport, "").update("CLEAR GRAPH <g>").await.unwrap_err();
        assert_eq!(err.to_string(), "SPARQL Update error: 401 Unauthorized access");
        assert_eq!(
            transport.requests()[0].url.as_str(),
            "http://localhost:8890/sparql-auth"
        );
    }
}
