//! Virtuoso adapter.
//!
//! Speaks the SPARQL 1.1 protocol over HTTP. Queries are form-POSTed to the
//! query endpoint, updates to the (usually authenticated) update endpoint.

mod client;
pub mod sparql;
mod tools;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::Adapter;
use super::handle::ClientHandle;
use super::http::{HttpTransport, TransportSource};
use crate::core::config::VirtuosoConfig;
use crate::domains::tools::{ToolInfo, ToolResult};

pub use client::VirtuosoClient;

pub struct VirtuosoAdapter {
    config: VirtuosoConfig,
    source: TransportSource,
    client: ClientHandle<VirtuosoClient>,
}

impl VirtuosoAdapter {
    pub const NAME: &'static str = "virtuoso";

    pub const DESCRIPTION: &'static str = "OpenLink Virtuoso RDF triplestore and SPARQL endpoint";

    pub fn new(config: VirtuosoConfig) -> Self {
        Self::with_source(config, TransportSource::Reqwest)
    }

    pub fn with_transport(config: VirtuosoConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_source(config, TransportSource::Fixed(transport))
    }

    fn with_source(config: VirtuosoConfig, source: TransportSource) -> Self {
        Self {
            config,
            source,
            client: ClientHandle::new("virtuoso"),
        }
    }

    pub(crate) async fn client(&self) -> ToolResult<Arc<VirtuosoClient>> {
        self.client
            .get_or_try_init(|| async {
                Ok(Arc::new(VirtuosoClient::new(&self.config, self.source.open()?)?))
            })
            .await
    }
}

#[async_trait]
impl Adapter for VirtuosoAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    async fn connect(&self) -> ToolResult<bool> {
        self.client().await?;
        info!("SPARQL client ready for {}", self.config.endpoint);
        Ok(true)
    }

    async fn disconnect(&self) -> ToolResult<()> {
        if self.client.take().await.is_some() {
            info!("SPARQL client released");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let probe = async { self.client().await?.select(sparql::PROBE).await };
        match probe.await {
            Ok(_) => true,
            Err(e) => {
                warn!("SPARQL probe failed: {}", e);
                false
            }
        }
    }

    fn tools(&self) -> Vec<ToolInfo> {
        tools::TOOLS.info()
    }

    async fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> ToolResult<Value> {
        tools::TOOLS.call(self, name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::backends::testing::RecordingTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_probe_sends_ask() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(200, json!({ "head": {}, "boolean": true }));
        let virtuoso =
            VirtuosoAdapter::with_transport(VirtuosoConfig::default(), transport.clone());

        assert!(virtuoso.is_connected().await);
        let body = transport.requests()[0].body.clone().unwrap();
        assert!(body.starts_with("query=ASK"));
    }

    #[tokio::test]
    async fn test_health_follows_server_not_connect() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_text(500, "text/plain", "boom");
        transport.respond_json(200, json!({ "head": {}, "boolean": true }));
        let virtuoso =
            VirtuosoAdapter::with_transport(VirtuosoConfig::default(), transport.clone());

        assert!(virtuoso.connect().await.unwrap());
        assert!(!virtuoso.is_connected().await);
        assert!(virtuoso.is_connected().await);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_endpoint_fails_connect() {
        let config = VirtuosoConfig {
            endpoint: "not a url".to_string(),
            ..VirtuosoConfig::default()
        };
        let virtuoso =
            VirtuosoAdapter::with_transport(config, Arc::new(RecordingTransport::new()));
        tokio_test::assert_err!(virtuoso.connect().await);
        tokio_test::assert_ok!(virtuoso.disconnect().await);
    }
}
