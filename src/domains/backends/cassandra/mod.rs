//! Cassandra adapter.
//!
//! Speaks CQL through a driver session created on first use. `connect`
//! performs the handshake eagerly; every tool reuses the same session until
//! `disconnect` drops it.
//!
//! A call naming a keyspace other than the configured one runs on a
//! short-lived session bound to that keyspace and dropped with the call. The
//! shared session never changes keyspace, so a call without `keyspace` always
//! runs in the configured default.

pub mod cql;
pub mod session;
mod tools;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::Adapter;
use super::handle::ClientHandle;
use crate::core::config::CassandraConfig;
use crate::domains::tools::{ToolInfo, ToolResult};
use cql::Statement;
use session::{CqlConnector, CqlSession, ScyllaConnector};

pub struct CassandraAdapter {
    config: CassandraConfig,
    connector: Arc<dyn CqlConnector>,
    session: ClientHandle<dyn CqlSession>,
}

impl CassandraAdapter {
    pub const NAME: &'static str = "cassandra";

    pub const DESCRIPTION: &'static str = "Apache Cassandra distributed NoSQL database";

    pub fn new(config: CassandraConfig) -> Self {
        Self::with_connector(config, Arc::new(ScyllaConnector))
    }

    pub fn with_connector(config: CassandraConfig, connector: Arc<dyn CqlConnector>) -> Self {
        Self {
            config,
            connector,
            session: ClientHandle::new("cassandra"),
        }
    }

    pub(crate) fn config(&self) -> &CassandraConfig {
        &self.config
    }

    pub(crate) async fn session(&self) -> ToolResult<Arc<dyn CqlSession>> {
        self.session
            .get_or_try_init(|| self.connector.connect(&self.config))
            .await
    }

    /// Session whose current keyspace is `keyspace`.
    ///
    /// The shared session serves no keyspace or the configured one; any other
    /// keyspace gets a fresh session owned by the caller.
    pub(crate) async fn session_in(
        &self,
        keyspace: Option<&str>,
    ) -> ToolResult<Arc<dyn CqlSession>> {
        let keyspace = match keyspace {
            Some(ks) if ks != self.config.keyspace => ks,
            _ => return self.session().await,
        };

        let config = CassandraConfig {
            keyspace: keyspace.to_string(),
            ..self.config.clone()
        };
        debug!("Opening Cassandra session for keyspace {}", keyspace);
        self.connector.connect(&config).await
    }
}

#[async_trait]
impl Adapter for CassandraAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    async fn connect(&self) -> ToolResult<bool> {
        self.session().await?;
        info!("Cassandra session ready");
        Ok(true)
    }

    async fn disconnect(&self) -> ToolResult<()> {
        if self.session.take().await.is_some() {
            info!("Cassandra session closed");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let probe = async {
            self.session()
                .await?
                .execute(&Statement::new(cql::RELEASE_VERSION))
                .await
        };
        match probe.await {
            Ok(_) => true,
            Err(e) => {
                warn!("Cassandra probe failed: {}", e);
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
