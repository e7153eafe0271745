//! Tools domain module.
//!
//! Everything between an MCP tool call and an adapter lives here:
//!
//! - `params.rs` - Parameter descriptors and string-argument coercion
//! - `descriptor.rs` - Tool descriptors and per-adapter tool tables
//! - `normalize.rs` - Result shaping shared by every backend (caps, counts, bindings)
//! - `registry.rs` - Adapter ownership and name-based dispatch
//! - `router.rs` - Dynamic ToolRouter builder for STDIO/TCP transport
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a Tool
//!
//! 1. Write the handler next to its adapter (`domains/backends/<name>/tools.rs`)
//! 2. Add a `ToolDescriptor` to that adapter's `TOOLS` table
//!
//! The registry and router pick it up from the table.

mod descriptor;
mod error;
pub mod normalize;
pub mod params;
mod registry;
pub mod router;

pub use descriptor::{Handler, ToolDescriptor, ToolInfo, ToolTable};
pub use error::{ToolError, ToolResult};
pub use params::{ParamSpec, ToolArgs};
pub use registry::{GATEWAY_STATUS, ToolRegistry};
pub use router::build_tool_router;
