//! Configuration management for the gateway.
//!
//! Everything is resolved once at startup from environment variables (after
//! loading an optional `.env` file) and is immutable afterwards. Each backend
//! gets its own section; secrets are redacted from `Debug` output.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Connection settings for every database backend.
    pub backends: BackendsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsConfig {
    pub arango: ArangoConfig,
    pub cassandra: CassandraConfig,
    pub couchdb: CouchDbConfig,
    pub virtuoso: VirtuosoConfig,
}

/// ArangoDB REST endpoint and credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct ArangoConfig {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Cassandra cluster settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct CassandraConfig {
    /// Nodes to bootstrap from, `host` or `host:port`.
    pub contact_points: Vec<String>,
    /// Local datacenter; also used for `NetworkTopologyStrategy` keyspaces.
    pub datacenter: String,
    /// Default keyspace, empty when none is configured.
    pub keyspace: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CouchDbConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Default database for document tools, empty when none is configured.
    pub database: String,
}

/// Virtuoso SPARQL endpoints.
#[derive(Clone, Serialize, Deserialize)]
pub struct VirtuosoConfig {
    /// Query endpoint.
    pub endpoint: String,
    /// Authenticated update endpoint.
    pub update_endpoint: String,
    pub username: String,
    pub password: String,
    /// Sent as `default-graph-uri` on queries when non-empty.
    pub default_graph: String,
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "[REDACTED]" }
}

impl fmt::Debug for ArangoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArangoConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

impl fmt::Debug for CassandraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CassandraConfig")
            .field("contact_points", &self.contact_points)
            .field("datacenter", &self.datacenter)
            .field("keyspace", &self.keyspace)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

impl fmt::Debug for CouchDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouchDbConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Debug for VirtuosoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtuosoConfig")
            .field("endpoint", &self.endpoint)
            .field("update_endpoint", &self.update_endpoint)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("default_graph", &self.default_graph)
            .finish()
    }
}

impl Default for ArangoConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8529".to_string(),
            database: "_system".to_string(),
            username: "root".to_string(),
            password: String::new(),
        }
    }
}

impl Default for CassandraConfig {
    fn default() -> Self {
        Self {
            contact_points: vec!["localhost".to_string()],
            datacenter: "datacenter1".to_string(),
            keyspace: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for CouchDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5984".to_string(),
            username: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl Default for VirtuosoConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8890/sparql".to_string(),
            update_endpoint: "http://localhost:8890/sparql-auth".to_string(),
            username: String::new(),
            password: String::new(),
            default_graph: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "db-gateway-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            backends: BackendsConfig::default(),
        }
    }
}

/// Overwrite `target` when `key` is set.
fn env_into(key: &str, target: &mut String) {
    if let Ok(value) = std::env::var(key) {
        *target = value;
    }
}

impl ArangoConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        env_into("ARANGO_URL", &mut config.url);
        env_into("ARANGO_DATABASE", &mut config.database);
        env_into("ARANGO_USERNAME", &mut config.username);
        env_into("ARANGO_PASSWORD", &mut config.password);
        config
    }
}

impl CassandraConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(points) = std::env::var("CASSANDRA_CONTACT_POINTS") {
            config.contact_points = points
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        env_into("CASSANDRA_DATACENTER", &mut config.datacenter);
        env_into("CASSANDRA_KEYSPACE", &mut config.keyspace);
        env_into("CASSANDRA_USERNAME", &mut config.username);
        env_into("CASSANDRA_PASSWORD", &mut config.password);
        config
    }

    /// Configured keyspace, if any.
    pub fn default_keyspace(&self) -> Option<&str> {
        Some(self.keyspace.as_str()).filter(|k| !k.is_empty())
    }
}

impl CouchDbConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        env_into("COUCHDB_URL", &mut config.url);
        env_into("COUCHDB_USERNAME", &mut config.username);
        env_into("COUCHDB_PASSWORD", &mut config.password);
        env_into("COUCHDB_DATABASE", &mut config.database);
        config
    }

    /// Configured database, if any.
    pub fn default_database(&self) -> Option<&str> {
        Some(self.database.as_str()).filter(|d| !d.is_empty())
    }
}

impl VirtuosoConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        env_into("VIRTUOSO_ENDPOINT", &mut config.endpoint);
        env_into("VIRTUOSO_UPDATE_ENDPOINT", &mut config.update_endpoint);
        env_into("VIRTUOSO_USERNAME", &mut config.username);
        env_into("VIRTUOSO_PASSWORD", &mut config.password);
        env_into("VIRTUOSO_DEFAULT_GRAPH", &mut config.default_graph);
        config
    }
}

impl BackendsConfig {
    pub fn from_env() -> Self {
        Self {
            arango: ArangoConfig::from_env(),
            cassandra: CassandraConfig::from_env(),
            couchdb: CouchDbConfig::from_env(),
            virtuoso: VirtuosoConfig::from_env(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix; each backend reads its own
    /// prefix (`ARANGO_`, `CASSANDRA_`, `COUCHDB_`, `VIRTUOSO_`).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        env_into("MCP_SERVER_NAME", &mut config.server.name);
        env_into("MCP_LOG_LEVEL", &mut config.logging.level);

        config.transport = TransportConfig::from_env();
        config.backends = BackendsConfig::from_env();

        config
    }

    /// Log the resolved backend settings (secrets redacted).
    pub fn log_summary(&self) {
        info!("Backends configured: {:?}", self.backends);
        if self.backends.cassandra.default_keyspace().is_none() {
            warn!("CASSANDRA_KEYSPACE not set - Cassandra tools will require an explicit keyspace");
        }
        if self.backends.couchdb.default_database().is_none() {
            warn!("COUCHDB_DATABASE not set - CouchDB document tools will require a database");
        }
    }
}
