//! Tool Registry - owns every adapter and dispatches tool calls by name.
//!
//! This module provides:
//! - The adapter set built from configuration
//! - A tool name -> adapter index (the first adapter to claim a name wins)
//! - Lifecycle fan-out (`connect_all`, `disconnect_all`)
//! - The gateway-level `gateway_status` tool

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use rmcp::model::Tool;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::descriptor::ToolInfo;
use super::error::{ToolError, ToolResult};
use crate::core::config::Config;
use crate::domains::backends::{
    Adapter, ArangoAdapter, CassandraAdapter, CouchDbAdapter, VirtuosoAdapter,
};

/// Reports every adapter with its connectivity.
pub const GATEWAY_STATUS: ToolInfo = ToolInfo {
    name: "gateway_status",
    description: "List the configured database adapters with their tool counts and connectivity",
    params: &[],
};

/// Tool registry - the single dispatch point for adapter tools.
pub struct ToolRegistry {
    adapters: Vec<Arc<dyn Adapter>>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Index the tools of `adapters`, in order.
    pub fn new(adapters: Vec<Arc<dyn Adapter>>) -> Self {
        let mut index = HashMap::new();
        for (position, adapter) in adapters.iter().enumerate() {
            for tool in adapter.tools() {
                if tool.name == GATEWAY_STATUS.name || index.contains_key(tool.name) {
                    warn!(
                        "Tool {} from {} shadowed by an earlier registration",
                        tool.name,
                        adapter.name()
                    );
                    continue;
                }
                index.insert(tool.name, position);
            }
        }
        debug!("Indexed {} tools across {} adapters", index.len(), adapters.len());
        Self { adapters, index }
    }

    /// The four built-in adapters, configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        let backends = &config.backends;
        Self::new(vec![
            Arc::new(ArangoAdapter::new(backends.arango.clone())),
            Arc::new(CassandraAdapter::new(backends.cassandra.clone())),
            Arc::new(CouchDbAdapter::new(backends.couchdb.clone())),
            Arc::new(VirtuosoAdapter::new(backends.virtuoso.clone())),
        ])
    }

    pub fn adapters(&self) -> &[Arc<dyn Adapter>] {
        &self.adapters
    }

    pub fn adapter(&self, name: &str) -> Option<&Arc<dyn Adapter>> {
        self.adapters.iter().find(|a| a.name() == name)
    }

    fn infos(&self) -> Vec<ToolInfo> {
        let mut infos = vec![GATEWAY_STATUS];
        for (position, adapter) in self.adapters.iter().enumerate() {
            infos.extend(
                adapter
                    .tools()
                    .into_iter()
                    .filter(|t| self.index.get(t.name) == Some(&position)),
            );
        }
        infos
    }

    /// Get all tool names, `gateway_status` first then adapter order.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.infos().into_iter().map(|t| t.name).collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.infos().iter().map(ToolInfo::to_tool).collect()
    }

    /// Dispatch a tool call to the adapter that owns `name`.
    pub async fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> ToolResult<Value> {
        if name == GATEWAY_STATUS.name {
            return Ok(self.status().await);
        }
        let position = self.index.get(name).ok_or_else(|| {
            warn!("Unknown tool requested: {}", name);
            ToolError::not_found(name)
        })?;
        let adapter = &self.adapters[*position];
        debug!("Routing {} to {}", name, adapter.name());
        adapter.call_tool(name, arguments).await
    }

    /// Connect every adapter concurrently.
    ///
    /// Failures are logged and returned; an unreachable backend does not keep
    /// the others from starting.
    pub async fn connect_all(&self) -> Vec<(&'static str, ToolResult<bool>)> {
        let outcomes = join_all(self.adapters.iter().map(|adapter| async move {
            (adapter.name(), adapter.connect().await)
        }))
        .await;
        for (name, outcome) in &outcomes {
            match outcome {
                Ok(_) => info!("Adapter {} connected", name),
                Err(e) => warn!("Adapter {} failed to connect: {}", name, e),
            }
        }
        outcomes
    }

    /// Disconnect every adapter, logging failures.
    pub async fn disconnect_all(&self) {
        for adapter in &self.adapters {
            if let Err(e) = adapter.disconnect().await {
                warn!("Adapter {} failed to disconnect: {}", adapter.name(), e);
            }
        }
        info!("All adapters disconnected");
    }

    /// Probe every adapter and describe the gateway.
    pub async fn status(&self) -> Value {
        let probes = join_all(self.adapters.iter().map(|a| a.is_connected())).await;
        let adapters: Vec<Value> = self
            .adapters
            .iter()
            .zip(probes)
            .map(|(adapter, connected)| {
                json!({
                    "name": adapter.name(),
                    "description": adapter.description(),
                    "tools": adapter.tools().len(),
                    "connected": connected,
                })
            })
            .collect();
        json!({ "count": adapters.len(), "adapters": adapters })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ArangoConfig, CouchDbConfig};
    use crate::domains::backends::testing::{RecordingTransport, arguments};

    fn registry(transport: &Arc<RecordingTransport>) -> ToolRegistry {
        ToolRegistry::new(vec![
            Arc::new(ArangoAdapter::with_transport(
                ArangoConfig::default(),
                transport.clone(),
            )),
            Arc::new(CouchDbAdapter::with_transport(
                CouchDbConfig::default(),
                transport.clone(),
            )),
        ])
    }

    #[test]
    fn test_registry_tool_names() {
        let registry = ToolRegistry::from_config(&Config::default());
        let names = registry.tool_names();
        assert_eq!(names.len(), 1 + 13 + 12 + 13 + 14);
        assert_eq!(names[0], "gateway_status");
        assert!(names.contains(&"arango_query"));
        assert!(names.contains(&"cassandra_cluster_info"));
        assert!(names.contains(&"couchdb_changes"));
        assert!(names.contains(&"virtuoso_text_search"));
    }

    #[test]
    fn test_tools_match_names() {
        let registry = ToolRegistry::from_config(&Config::default());
        let tools = registry.get_all_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names, registry.tool_names());
    }

    #[tokio::test]
    async fn test_call_routes_to_owner() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(200, json!(["_users", "orders"]));

        let result = registry(&transport)
            .call_tool("couchdb_list_databases", &Map::new())
            .await
            .unwrap();

        assert_eq!(result, json!({ "count": 2, "databases": ["_users", "orders"] }));
        assert_eq!(transport.requests()[0].url.path(), "/_all_dbs");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let transport = Arc::new(RecordingTransport::new());
        let err = registry(&transport)
            .call_tool("mongo_find", &arguments(&[("q", "{}")]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: mongo_find");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_status_reports_probes() {
        let transport = Arc::new(RecordingTransport::unreachable());
        let status = registry(&transport)
            .call_tool("gateway_status", &Map::new())
            .await
            .unwrap();

        assert_eq!(status["count"], 2);
        assert_eq!(status["adapters"][0]["name"], "arangodb");
        assert_eq!(status["adapters"][0]["tools"], 13);
        assert_eq!(status["adapters"][0]["connected"], false);
        assert_eq!(status["adapters"][1]["name"], "couchdb");
    }

    #[tokio::test]
    async fn test_connect_all_and_disconnect_all() {
        let transport = Arc::new(RecordingTransport::new());
        let registry = registry(&transport);

        let outcomes = registry.connect_all().await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, outcome)| matches!(outcome, Ok(true))));

        registry.disconnect_all().await;
        registry.disconnect_all().await;
    }
}
