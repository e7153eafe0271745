//! MCP Server implementation.
//!
//! The handler only advertises tools. Its `ToolRouter` is built once from the
//! registry, so adding a tool to an adapter's table never touches this file.

use std::sync::Arc;

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};

use super::config::Config;
use crate::domains::tools::{ToolRegistry, build_tool_router};

/// The main MCP server handler.
///
/// Cheap to clone: the TCP transport hands one clone to every session, and
/// all of them share the same adapters.
#[derive(Clone)]
pub struct McpServer {
    config: Arc<Config>,
    registry: Arc<ToolRegistry>,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a server over an existing registry.
    pub fn new(config: Config, registry: Arc<ToolRegistry>) -> Self {
        Self {
            tool_router: build_tool_router::<Self>(registry.clone()),
            config: Arc::new(config),
            registry,
        }
    }

    /// Create a server with the built-in adapters configured from `config`.
    pub fn from_config(config: Config) -> Self {
        let registry = Arc::new(ToolRegistry::from_config(&config));
        Self::new(config, registry)
    }

    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Database gateway. Tools are prefixed by backend (arango_, cassandra_, \
                 couchdb_, virtuoso_); all parameters are strings and JSON-valued \
                 parameters take JSON text. Call gateway_status to see which backends \
                 are reachable."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_advertises_registry_tools() {
        let server = McpServer::from_config(Config::default());
        let routed = server.tool_router.list_all().len();
        assert_eq!(routed, server.registry().tool_names().len());
        assert!(server.get_info().capabilities.tools.is_some());
        assert!(server.get_info().capabilities.resources.is_none());
    }
}
