//! ArangoDB tool table.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::ArangoAdapter;
use super::aql::{self, AqlQuery, CollectionKind, Direction, IndexKind, Traversal};
use crate::domains::tools::normalize::{QUERY_CAP, counted, strip_status};
use crate::domains::tools::{ParamSpec, ToolArgs, ToolDescriptor, ToolResult, ToolTable};

const COLLECTION: ParamSpec = ParamSpec::text("collection", "Collection name").required("Collection name");
const KEY: ParamSpec = ParamSpec::text("key", "Document _key").required("Document key");

pub(super) static TOOLS: ToolTable<ArangoAdapter> = ToolTable::new(&[
    ToolDescriptor {
        name: "arango_list_databases",
        description: "List all ArangoDB databases",
        params: &[],
        handler: list_databases,
    },
    ToolDescriptor {
        name: "arango_list_collections",
        description: "List all collections in the current database",
        params: &[],
        handler: list_collections,
    },
    ToolDescriptor {
        name: "arango_collection_info",
        description: "Get detailed information about a collection",
        params: &[COLLECTION],
        handler: collection_info,
    },
    ToolDescriptor {
        name: "arango_create_collection",
        description: "Create a new document or edge collection",
        params: &[
            ParamSpec::text("name", "Collection name").required("Collection name"),
            ParamSpec::text("type", "Collection type: 'document' or 'edge'"),
        ],
        handler: create_collection,
    },
    ToolDescriptor {
        name: "arango_create_index",
        description: "Create an index on a collection",
        params: &[
            COLLECTION,
            ParamSpec::text(
                "type",
                "Index type: 'persistent', 'hash', 'skiplist', 'fulltext', 'geo'",
            )
            .required("Index type"),
            ParamSpec::text("fields", "Comma-separated field names").required("Fields"),
            ParamSpec::text("unique", "Unique index: 'true' or 'false' (default false)").boolean(),
        ],
        handler: create_index,
    },
    ToolDescriptor {
        name: "arango_insert",
        description: "Insert a document into a collection",
        params: &[
            COLLECTION,
            ParamSpec::text("document", "Document as JSON string")
                .json()
                .required("Document"),
        ],
        handler: insert,
    },
    ToolDescriptor {
        name: "arango_get",
        description: "Get a document by its _key",
        params: &[COLLECTION, KEY],
        handler: get,
    },
    ToolDescriptor {
        name: "arango_update",
        description: "Update a document (partial update/merge)",
        params: &[
            COLLECTION,
            KEY,
            ParamSpec::text("update", "Update data as JSON string")
                .json()
                .required("Update data"),
        ],
        handler: update,
    },
    ToolDescriptor {
        name: "arango_delete",
        description: "Delete a document by its _key",
        params: &[COLLECTION, KEY],
        handler: delete,
    },
    ToolDescriptor {
        name: "arango_query",
        description: "Execute an AQL query with optional bind variables",
        params: &[
            ParamSpec::text("query", "AQL query to execute").required("Query"),
            ParamSpec::text("bindVars", "Bind variables as JSON object (optional)").json(),
        ],
        handler: query,
    },
    ToolDescriptor {
        name: "arango_explain",
        description: "Explain an AQL query execution plan",
        params: &[ParamSpec::text("query", "AQL query to explain").required("Query")],
        handler: explain,
    },
    ToolDescriptor {
        name: "arango_traverse",
        description: "Traverse a graph from a start vertex",
        params: &[
            ParamSpec::text("startVertex", "Start vertex ID (collection/key)")
                .required("Start vertex"),
            ParamSpec::text("edgeCollection", "Edge collection name")
                .required("Edge collection"),
            ParamSpec::text("direction", "Direction: 'outbound', 'inbound', or 'any'"),
            ParamSpec::text("minDepth", "Minimum depth (default 1)").integer(),
            ParamSpec::text("maxDepth", "Maximum depth (default 1)").integer(),
        ],
        handler: traverse,
    },
    ToolDescriptor {
        name: "arango_list_graphs",
        description: "List all named graphs in the database",
        params: &[],
        handler: list_graphs,
    },
]);

fn list_databases(adapter: &ArangoAdapter, _args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let client = adapter.system_db().await?;
        let body = client.call(aql::list_databases()).await?;
        Ok(json!({ "databases": body.get("result").cloned().unwrap_or(json!([])) }))
    }
    .boxed()
}

fn list_collections(adapter: &ArangoAdapter, _args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let client = adapter.db().await?;
        let body = client.call(aql::list_collections()).await?;
        let collections: Vec<Value> = body
            .get("result")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|c| {
                        let kind = CollectionKind::from_code(c.get("type").and_then(Value::as_u64));
                        json!({ "name": c.get("name"), "type": kind.to_string() })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(json!({ "collections": collections }))
    }
    .boxed()
}

fn collection_info(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let collection = args.required("collection")?;
        let client = adapter.db().await?;

        let (properties, count, indexes) = tokio::try_join!(
            client.call(aql::collection_properties(collection)),
            client.call(aql::collection_count(collection)),
            client.call(aql::collection_indexes(collection)),
        )?;

        Ok(json!({
            "properties": strip_status(properties),
            "count": count.get("count").cloned().unwrap_or(Value::Null),
            "indexes": indexes.get("indexes").cloned().unwrap_or(json!([])),
        }))
    }
    .boxed()
}

fn create_collection(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let name = args.required("name")?;
        let kind = CollectionKind::parse(args.optional("type"))?;
        let client = adapter.db().await?;
        client.call(aql::create_collection(name, kind)).await?;
        Ok(json!({
            "success": true,
            "message": format!("Collection '{}' created ({})", name, kind),
        }))
    }
    .boxed()
}

fn create_index(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let collection = args.required("collection")?;
        let kind: IndexKind = args.required("type")?.parse()?;
        let fields = aql::split_fields(args.required("fields")?);
        let unique = args.flag("unique");

        let client = adapter.db().await?;
        let body = client
            .call(aql::create_index(collection, kind, &fields, unique))
            .await?;
        Ok(strip_status(body))
    }
    .boxed()
}

fn insert(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let collection = args.required("collection")?;
        let document: Value = args.required_json("document")?;
        let client = adapter.db().await?;
        client.call(aql::insert_document(collection, document)).await
    }
    .boxed()
}

fn get(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let collection = args.required("collection")?;
        let key = args.required("key")?;
        let client = adapter.db().await?;
        client.call(aql::get_document(collection, key)).await
    }
    .boxed()
}

fn update(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let collection = args.required("collection")?;
        let key = args.required("key")?;
        let patch: Value = args.required_json("update")?;
        let client = adapter.db().await?;
        client.call(aql::update_document(collection, key, patch)).await
    }
    .boxed()
}

fn delete(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let collection = args.required("collection")?;
        let key = args.required("key")?;
        let client = adapter.db().await?;
        client.call(aql::remove_document(collection, key)).await
    }
    .boxed()
}

fn query(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let text = args.required("query")?;
        let bind_vars: Map<String, Value> = args.json("bindVars")?.unwrap_or_default();
        let client = adapter.db().await?;
        let results = client.query_all(&AqlQuery::new(text, bind_vars)).await?;
        Ok(counted("results", results, QUERY_CAP))
    }
    .boxed()
}

fn explain(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let text = args.required("query")?;
        let client = adapter.db().await?;
        let body = client.call(aql::explain(text)).await?;
        Ok(strip_status(body))
    }
    .boxed()
}

fn traverse(adapter: &ArangoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let traversal = Traversal {
            start_vertex: args.required("startVertex")?,
            edge_collection: args.required("edgeCollection")?,
            direction: Direction::parse(args.optional("direction"))?,
            min_depth: args.integer_or("minDepth", 1)?,
            max_depth: args.integer_or("maxDepth", 1)?,
        };
        let client = adapter.db().await?;
        let results = client.query_all(&traversal.to_query()).await?;
        Ok(counted("results", results, QUERY_CAP))
    }
    .boxed()
}

fn list_graphs(adapter: &ArangoAdapter, _args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let client = adapter.db().await?;
        let body = client.call(aql::list_graphs()).await?;
        Ok(json!({ "graphs": body.get("graphs").cloned().unwrap_or(json!([])) }))
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;

    use super::*;
    use crate::core::config::ArangoConfig;
    use crate::domains::backends::Adapter;
    use crate::domains::backends::testing::{RecordingTransport, arguments};

    fn adapter(transport: &Arc<RecordingTransport>) -> ArangoAdapter {
        ArangoAdapter::with_transport(ArangoConfig::default(), transport.clone())
    }

    #[tokio::test]
    async fn test_create_fulltext_index_ignores_unique() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(
            201,
            json!({ "error": false, "code": 201, "id": "docs/123", "type": "fulltext", "isNewlyCreated": true }),
        );

        let result = adapter(&transport)
            .call_tool(
                "arango_create_index",
                &arguments(&[("collection", "docs"), ("type", "fulltext"), ("fields", "body"), ("unique", "true")]),
            )
            .await
            .unwrap();

        assert_eq!(result["isNewlyCreated"], true);
        assert!(result.get("error").is_none());
        let request = &transport.requests()[0];
        assert_eq!(request.url.path(), "/_db/_system/_api/index");
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "type": "fulltext", "fields": ["body"] }));
    }

    #[tokio::test]
    async fn test_unknown_index_type_makes_no_call() {
        let transport = Arc::new(RecordingTransport::new());
        let err = adapter(&transport)
            .call_tool(
                "arango_create_index",
                &arguments(&[("collection", "docs"), ("type", "rtree"), ("fields", "a")]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown index type: rtree");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_query_drains_cursor_and_caps() {
        let transport = Arc::new(RecordingTransport::new());
        let first: Vec<Value> = (0..150).map(|i| json!(i)).collect();
        let second: Vec<Value> = (150..250).map(|i| json!(i)).collect();
        transport.respond_json(201, json!({ "result": first, "hasMore": true, "id": "77" }));
        transport.respond_json(200, json!({ "result": second, "hasMore": false }));

        let result = adapter(&transport)
            .call_tool("arango_query", &arguments(&[("query", "FOR d IN docs RETURN d")]))
            .await
            .unwrap();

        assert_eq!(result["count"], 250);
        assert_eq!(result["results"].as_array().unwrap().len(), 100);
        let requests = transport.requests();
        assert_eq!(requests[1].method, Method::PUT);
        assert_eq!(requests[1].url.path(), "/_db/_system/_api/cursor/77");
    }

    #[tokio::test]
    async fn test_traverse_sends_bind_vars() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(201, json!({ "result": [{ "vertex": {}, "edge": null }], "hasMore": false }));

        let result = adapter(&transport)
            .call_tool(
                "arango_traverse",
                &arguments(&[
                    ("startVertex", "users/1"),
                    ("edgeCollection", "follows"),
                    ("direction", "inbound"),
                    ("minDepth", "2"),
                    ("maxDepth", "4"),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(result["count"], 1);

        let body: Value = serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
        assert!(body["query"].as_str().unwrap().contains("2..4 INBOUND"));
        assert_eq!(body["bindVars"], json!({ "start": "users/1", "@edges": "follows" }));
    }

    #[tokio::test]
    async fn test_collection_info_joins_three_reads() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(200, json!({ "error": false, "code": 200, "name": "users", "waitForSync": false }));
        transport.respond_json(200, json!({ "count": 12 }));
        transport.respond_json(200, json!({ "indexes": [{ "type": "primary" }] }));

        let result = adapter(&transport)
            .call_tool("arango_collection_info", &arguments(&[("collection", "users")]))
            .await
            .unwrap();

        assert_eq!(transport.requests().len(), 3);
        assert!(result["properties"].get("code").is_none());
        assert!(result.get("count").is_some());
        assert!(result["indexes"].is_array());
    }

    #[tokio::test]
    async fn test_backend_error_message() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(
            404,
            json!({ "error": true, "code": 404, "errorNum": 1202, "errorMessage": "document not found" }),
        );
        let err = adapter(&transport)
            .call_tool("arango_get", &arguments(&[("collection", "users"), ("key", "nope")]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "ArangoDB error: document not found");
    }

    #[tokio::test]
    async fn test_list_collections_maps_type() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_json(
            200,
            json!({ "result": [{ "name": "users", "type": 2 }, { "name": "follows", "type": 3 }] }),
        );
        let result = adapter(&transport)
            .call_tool("arango_list_collections", &Map::new())
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({ "collections": [
                { "name": "users", "type": "document" },
                { "name": "follows", "type": "edge" }
            ]})
        );
    }
}
