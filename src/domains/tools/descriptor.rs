//! Tool descriptors and per-adapter tool tables.

use std::borrow::Cow;
use std::sync::Arc;

use futures::future::BoxFuture;
use rmcp::model::Tool;
use serde_json::{Map, Value};
use tracing::debug;

use super::error::{ToolError, ToolResult};
use super::params::{ParamSpec, ToolArgs, input_schema};

/// Async handler bound to an adapter type.
pub type Handler<A> = for<'a> fn(&'a A, ToolArgs) -> BoxFuture<'a, ToolResult<Value>>;

/// A named, independently invocable operation.
pub struct ToolDescriptor<A: 'static> {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub handler: Handler<A>,
}

/// Adapter-independent view of a tool, used for listing.
#[derive(Debug, Clone, Copy)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolInfo {
    /// Create a Tool model for this tool (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: Cow::Borrowed(self.name),
            description: Some(Cow::Borrowed(self.description)),
            input_schema: Arc::new(input_schema(self.params)),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// The static tool table of one adapter.
pub struct ToolTable<A: 'static> {
    descriptors: &'static [ToolDescriptor<A>],
}

impl<A: 'static> ToolTable<A> {
    pub const fn new(descriptors: &'static [ToolDescriptor<A>]) -> Self {
        Self { descriptors }
    }

    pub fn get(&self, name: &str) -> Option<&'static ToolDescriptor<A>> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn info(&self) -> Vec<ToolInfo> {
        self.descriptors
            .iter()
            .map(|d| ToolInfo {
                name: d.name,
                description: d.description,
                params: d.params,
            })
            .collect()
    }

    /// Look up `name`, validate the arguments against its parameter kinds,
    /// and run its handler against `adapter`.
    pub async fn call(
        &self,
        adapter: &A,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> ToolResult<Value> {
        let descriptor = self.get(name).ok_or_else(|| ToolError::not_found(name))?;
        debug!("Dispatching tool {}", descriptor.name);
        let args = ToolArgs::from_json(arguments, descriptor.params);
        args.validate()?;
        (descriptor.handler)(adapter, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;
    use serde_json::json;

    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
    }

    fn echo(adapter: &Echo, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
        async move {
            adapter.calls.fetch_add(1, Ordering::SeqCst);
            let word = args.required("word")?;
            Ok(json!({ "word": word }))
        }
        .boxed()
    }

    static TABLE: ToolTable<Echo> = ToolTable::new(&[ToolDescriptor {
        name: "echo",
        description: "Echo a word",
        params: &[
            ParamSpec::text("word", "Word to echo").required("Word"),
            ParamSpec::text("times", "Repetitions").integer(),
            ParamSpec::text("meta", "Extra JSON").json(),
        ],
        handler: echo,
    }]);

    #[tokio::test]
    async fn test_call_dispatches_by_name() {
        let args = json!({ "word": "hi" }).as_object().cloned().unwrap();
        let value = TABLE.call(&Echo::default(), "echo", &args).await.unwrap();
        assert_eq!(value, json!({ "word": "hi" }));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let err = TABLE.call(&Echo::default(), "nope", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_parameter_from_table() {
        let err = TABLE.call(&Echo::default(), "echo", &Map::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Word required");
    }

    #[tokio::test]
    async fn test_mistyped_arguments_rejected_before_handler() {
        let echo = Echo::default();

        let args = json!({ "word": "hi", "times": "twice" }).as_object().cloned().unwrap();
        let err = TABLE.call(&echo, "echo", &args).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid arguments: 'times' is not an integer: twice");

        let args = json!({ "word": "hi", "meta": "{bad" }).as_object().cloned().unwrap();
        let err = TABLE.call(&echo, "echo", &args).await.unwrap_err();
        assert!(matches!(err, ToolError::Parse(_)));

        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);

        let args = json!({ "word": "hi", "times": 2, "meta": "{}" }).as_object().cloned().unwrap();
        tokio_test::assert_ok!(TABLE.call(&echo, "echo", &args).await);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_to_tool_schema() {
        let tool = TABLE.info()[0].to_tool();
        assert_eq!(tool.name, "echo");
        assert_eq!(tool.input_schema["required"], json!(["word"]));
    }
}
