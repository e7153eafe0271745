//! Domains module containing the gateway's business logic.
//!
//! `backends` knows how to talk to each database; `tools` turns those
//! adapters into named, schema-described MCP tools.

pub mod backends;
pub mod tools;
