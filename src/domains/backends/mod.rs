//! Backend adapters.
//!
//! Each adapter wraps one database behind the same lifecycle contract and a
//! static tool table:
//!
//! - `arango` - ArangoDB multi-model store over its REST API
//! - `cassandra` - Apache Cassandra over the native CQL protocol
//! - `couchdb` - Apache CouchDB over HTTP
//! - `virtuoso` - OpenLink Virtuoso SPARQL endpoint
//!
//! Adapters never expose their transport. Callers see tool names, string
//! parameters and JSON results.

pub mod arango;
pub mod cassandra;
pub mod couchdb;
mod handle;
pub mod http;
pub mod virtuoso;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domains::tools::{ToolInfo, ToolResult};

pub use arango::ArangoAdapter;
pub use cassandra::CassandraAdapter;
pub use couchdb::CouchDbAdapter;
pub use handle::ClientHandle;
pub use virtuoso::VirtuosoAdapter;

/// Lifecycle and tool contract implemented by every backend.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Static identity, e.g. `"cassandra"`.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Ensure a usable client exists.
    ///
    /// Fails only when the client cannot be constructed or, for driver-backed
    /// backends, the handshake fails.
    async fn connect(&self) -> ToolResult<bool>;

    /// Release the client. Calling it again is a no-op.
    async fn disconnect(&self) -> ToolResult<()>;

    /// Cheap round-trip probe. Never fails; any error reads as `false`.
    async fn is_connected(&self) -> bool;

    /// Metadata for every tool of this adapter.
    fn tools(&self) -> Vec<ToolInfo>;

    /// Run the tool `name` with the caller's arguments.
    async fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> ToolResult<Value>;
}
