//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Every registered tool becomes one dynamic route. Tool failures are
//! reported in-band as `isError` results carrying the error line; protocol
//! errors are reserved for malformed requests.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter};
use rmcp::model::{CallToolResult, Content};
use serde_json::Value;
use tracing::{instrument, warn};

use super::error::ToolResult;
use super::registry::ToolRegistry;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(registry: Arc<ToolRegistry>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .get_all_tools()
        .into_iter()
        .fold(ToolRouter::new(), |router, tool| {
            let name = tool.name.to_string();
            let registry = registry.clone();
            router.with_route(ToolRoute::new_dyn(
                tool,
                move |ctx: ToolCallContext<'_, S>| {
                    let args = ctx.arguments.clone().unwrap_or_default();
                    let registry = registry.clone();
                    let name = name.clone();
                    async move { Ok(into_call_result(&name, registry.call_tool(&name, &args).await)) }
                        .boxed()
                },
            ))
        })
}

/// Pretty JSON text on success, the error line on failure.
#[instrument(skip(outcome))]
fn into_call_result(name: &str, outcome: ToolResult<Value>) -> CallToolResult {
    match outcome {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            CallToolResult::success(vec![Content::text(text)])
        }
        Err(e) => {
            warn!("Tool {} failed: {}", name, e);
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::domains::tools::ToolError;
    use serde_json::json;

    struct TestServer {}

    fn text(result: &CallToolResult) -> String {
        result.content[0]
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_build_router() {
        let registry = Arc::new(ToolRegistry::from_config(&Config::default()));
        let router: ToolRouter<TestServer> = build_tool_router(registry.clone());
        let tools = router.list_all();
        assert_eq!(tools.len(), registry.tool_names().len());

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"gateway_status"));
        assert!(names.contains(&"arango_traverse"));
        assert!(names.contains(&"cassandra_batch"));
        assert!(names.contains(&"couchdb_bulk_docs"));
        assert!(names.contains(&"virtuoso_graph_stats"));
    }

    #[test]
    fn test_success_is_pretty_json() {
        let result = into_call_result("t", Ok(json!({ "count": 1 })));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(text(&result), "{\n  \"count\": 1\n}");
    }

    #[test]
    fn test_failure_carries_error_line() {
        let result = into_call_result("t", Err(ToolError::missing("Keyspace")));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result), "Keyspace required");
    }
}
