//! CouchDB adapter.
//!
//! Plain HTTP: `connect` only builds the client and flips a flag, actual
//! connectivity is checked per request and by the `GET /` probe.

mod client;
pub mod request;
mod tools;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::Adapter;
use super::handle::ClientHandle;
use super::http::{HttpTransport, TransportSource};
use crate::core::config::CouchDbConfig;
use crate::domains::tools::{ToolInfo, ToolResult};

pub use client::CouchClient;

pub struct CouchDbAdapter {
    config: CouchDbConfig,
    source: TransportSource,
    client: ClientHandle<CouchClient>,
}

impl CouchDbAdapter {
    pub const NAME: &'static str = "couchdb";

    pub const DESCRIPTION: &'static str = "Apache CouchDB document database";

    pub fn new(config: CouchDbConfig) -> Self {
        Self::with_source(config, TransportSource::Reqwest)
    }

    pub fn with_transport(config: CouchDbConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_source(config, TransportSource::Fixed(transport))
    }

    fn with_source(config: CouchDbConfig, source: TransportSource) -> Self {
        Self {
            config,
            source,
            client: ClientHandle::new("couchdb"),
        }
    }

    pub(crate) fn config(&self) -> &CouchDbConfig {
        &self.config
    }

    pub(crate) async fn client(&self) -> ToolResult<Arc<CouchClient>> {
        self.client
            .get_or_try_init(|| async {
                Ok(Arc::new(CouchClient::new(&self.config, self.source.open()?)?))
            })
            .await
    }
}

#[async_trait]
impl Adapter for CouchDbAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    async fn connect(&self) -> ToolResult<bool> {
        self.client().await?;
        info!("CouchDB client ready for {}", self.config.url);
        Ok(true)
    }

    async fn disconnect(&self) -> ToolResult<()> {
        self.client.take().await;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let probe = async { self.client().await?.request(request::server_root()).await };
        match probe.await {
            Ok(_) => true,
            Err(e) => {
                warn!("CouchDB probe failed: {}", e);
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
