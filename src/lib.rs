//! Database gateway MCP server.
//!
//! Exposes ArangoDB, Apache Cassandra, Apache CouchDB and OpenLink Virtuoso
//! as one flat set of named tools. Every tool takes string parameters and
//! returns a JSON value; failures surface as a single error line.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server handler and transports
//! - **domains**
//!   - **backends**: the adapter contract and one adapter per database
//!   - **tools**: parameter coercion, tool tables, result normalization,
//!     the registry and the rmcp router
//!
//! # Example
//!
//! ```rust,no_run
//! use db_gateway_mcp::core::{Config, McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = McpServer::from_config(Config::from_env());
//!     server.registry().connect_all().await;
//!     // Serve it with a TransportService...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

pub use core::{Config, Error, McpServer, Result};
