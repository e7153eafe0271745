//! ArangoDB adapter.
//!
//! Multi-model database (document, graph, key-value) reached through its
//! REST API. Two handles are kept: one bound to the configured database and
//! one bound to `_system` for server-wide operations.

pub mod aql;
mod client;
mod tools;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::handle::ClientHandle;
use super::http::{HttpTransport, TransportSource};
use super::Adapter;
use crate::core::config::ArangoConfig;
use crate::domains::tools::{ToolInfo, ToolResult};

pub use client::ArangoClient;

const SYSTEM_DATABASE: &str = "_system";

pub struct ArangoAdapter {
    config: ArangoConfig,
    source: TransportSource,
    db: ClientHandle<ArangoClient>,
    system_db: ClientHandle<ArangoClient>,
}

impl ArangoAdapter {
    pub const NAME: &'static str = "arangodb";

    pub const DESCRIPTION: &'static str =
        "ArangoDB multi-model database (document, graph, key-value)";

    pub fn new(config: ArangoConfig) -> Self {
        Self::with_source(config, TransportSource::Reqwest)
    }

    /// Build the adapter over a supplied transport.
    pub fn with_transport(config: ArangoConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_source(config, TransportSource::Fixed(transport))
    }

    fn with_source(config: ArangoConfig, source: TransportSource) -> Self {
        Self {
            config,
            source,
            db: ClientHandle::new("arangodb"),
            system_db: ClientHandle::new("arangodb _system"),
        }
    }

    /// Client for the configured database.
    pub(crate) async fn db(&self) -> ToolResult<Arc<ArangoClient>> {
        self.db
            .get_or_try_init(|| async {
                let client = ArangoClient::new(&self.config, &self.config.database, self.source.open()?)?;
                Ok(Arc::new(client))
            })
            .await
    }

    /// Client for `_system`.
    pub(crate) async fn system_db(&self) -> ToolResult<Arc<ArangoClient>> {
        self.system_db
            .get_or_try_init(|| async {
                let client = ArangoClient::new(&self.config, SYSTEM_DATABASE, self.source.open()?)?;
                Ok(Arc::new(client))
            })
            .await
    }
}

#[async_trait]
impl Adapter for ArangoAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    async fn connect(&self) -> ToolResult<bool> {
        let client = self.db().await?;
        info!("ArangoDB client ready for database {}", client.database());
        Ok(true)
    }

    async fn disconnect(&self) -> ToolResult<()> {
        self.db.take().await;
        self.system_db.take().await;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let probe = async { self.db().await?.version().await };
        match probe.await {
            Ok(_) => true,
            Err(e) => {
                warn!("ArangoDB probe failed: {}", e);
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

    fn adapter(transport: Arc<RecordingTransport>) -> ArangoAdapter {
        ArangoAdapter::with_transport(ArangoConfig::default(), transport)
    }

    #[tokio::test]
    async fn test_is_connected_false_when_unreachable() {
        let transport = Arc::new(RecordingTransport::unreachable());
        assert!(!adapter(transport).is_connected().await);
    }

    #[tokio::test]
    async fn test_is_connected_probes_version() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(200, json!({ "server": "arango", "version": "3.11.0" }));
        let arango = adapter(transport.clone());

        assert!(arango.is_connected().await);
        let requests = transport.requests();
        assert_eq!(requests[0].url.path(), "/_db/_system/_api/version");
    }

    #[tokio::test]
    async fn test_disconnect_twice() {
        let arango = adapter(Arc::new(RecordingTransport::new()));
        assert!(arango.connect().await.unwrap());
        tokio_test::assert_ok!(arango.disconnect().await);
        tokio_test::assert_ok!(arango.disconnect().await);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_connect() {
        let config = ArangoConfig {
            url: "::not a url::".to_string(),
            ..ArangoConfig::default()
        };
        let arango = ArangoAdapter::with_transport(config, Arc::new(RecordingTransport::new()));
        assert!(arango.connect().await.is_err());
        assert!(!arango.is_connected().await);
    }
}
