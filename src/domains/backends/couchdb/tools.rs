//! CouchDB tool table.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::CouchDbAdapter;
use super::request::{self, ALL_DOCS_LIMIT, CHANGES_LIMIT, MangoIndex, MangoQuery, ViewQuery};
use crate::domains::tools::normalize::partition_outcomes;
use crate::domains::tools::{ParamSpec, ToolArgs, ToolDescriptor, ToolError, ToolResult, ToolTable};

const DATABASE: ParamSpec = ParamSpec::text(
    "database",
    "Database name (uses COUCHDB_DATABASE if not provided)",
);
const DATABASE_NAME: ParamSpec = ParamSpec::text("name", "Database name").required("Database name");
const DOC_ID: ParamSpec = ParamSpec::text("id", "Document ID").required("Document ID");
const INCLUDE_DOCS: ParamSpec =
    ParamSpec::text("include_docs", "Include document bodies (true/false, default false)").boolean();

pub(super) static TOOLS: ToolTable<CouchDbAdapter> = ToolTable::new(&[
    ToolDescriptor {
        name: "couchdb_list_databases",
        description: "List all databases on the CouchDB server",
        params: &[],
        handler: list_databases,
    },
    ToolDescriptor {
        name: "couchdb_create_database",
        description: "Create a new database",
        params: &[DATABASE_NAME],
        handler: create_database,
    },
    ToolDescriptor {
        name: "couchdb_delete_database",
        description: "Delete a database",
        params: &[DATABASE_NAME],
        handler: delete_database,
    },
    ToolDescriptor {
        name: "couchdb_info",
        description: "Get database information",
        params: &[DATABASE],
        handler: info,
    },
    ToolDescriptor {
        name: "couchdb_all_docs",
        description: "Get all documents in a database",
        params: &[
            DATABASE,
            INCLUDE_DOCS,
            ParamSpec::text("limit", "Max documents to return (default 100)").integer(),
            ParamSpec::text("skip", "Number of documents to skip").integer(),
        ],
        handler: all_docs,
    },
    ToolDescriptor {
        name: "couchdb_get",
        description: "Get a document by ID",
        params: &[
            DATABASE,
            DOC_ID,
            ParamSpec::text("rev", "Specific revision (optional)"),
        ],
        handler: get,
    },
    ToolDescriptor {
        name: "couchdb_insert",
        description: "Create or update a document",
        params: &[
            DATABASE,
            ParamSpec::text("document", "Document as JSON string")
                .json()
                .required("Document"),
            ParamSpec::text("id", "Document ID (optional, auto-generated if not provided)"),
        ],
        handler: insert,
    },
    ToolDescriptor {
        name: "couchdb_delete",
        description: "Delete a document",
        params: &[
            DATABASE,
            DOC_ID,
            ParamSpec::text("rev", "Document revision (_rev)").required("Document revision"),
        ],
        handler: delete,
    },
    ToolDescriptor {
        name: "couchdb_find",
        description: "Find documents using Mango query selector",
        params: &[
            DATABASE,
            ParamSpec::text("selector", "Mango selector as JSON (e.g., '{\"type\": \"user\"}')")
                .json()
                .required("Selector"),
            ParamSpec::text("fields", "Fields to return as JSON array (optional)").json(),
            ParamSpec::text("limit", "Max documents to return (default 25)").integer(),
            ParamSpec::text("skip", "Number of documents to skip").integer(),
            ParamSpec::text("sort", "Sort order as JSON array (optional)").json(),
        ],
        handler: find,
    },
    ToolDescriptor {
        name: "couchdb_create_index",
        description: "Create a Mango index",
        params: &[
            DATABASE,
            ParamSpec::text("fields", "Fields to index as JSON array (e.g., '[\"type\", \"name\"]')")
                .json()
                .required("Fields"),
            ParamSpec::text("name", "Index name (optional)"),
            ParamSpec::text("ddoc", "Design document name (optional)"),
        ],
        handler: create_index,
    },
    ToolDescriptor {
        name: "couchdb_view",
        description: "Query a view",
        params: &[
            DATABASE,
            ParamSpec::text("design", "Design document name (without _design/ prefix)")
                .required("Design document name"),
            ParamSpec::text("view", "View name").required("View name"),
            ParamSpec::text("key", "Exact key to match (JSON value)"),
            ParamSpec::text("startkey", "Start key (JSON value)"),
            ParamSpec::text("endkey", "End key (JSON value)"),
            ParamSpec::text("limit", "Max rows to return").integer(),
            ParamSpec::text("include_docs", "Include documents (true/false)").boolean(),
            ParamSpec::text("reduce", "Use reduce function (true/false)").boolean(),
            ParamSpec::text("group", "Group reduce results (true/false)").boolean(),
        ],
        handler: view,
    },
    ToolDescriptor {
        name: "couchdb_bulk_docs",
        description: "Insert, update, or delete multiple documents at once",
        params: &[
            DATABASE,
            ParamSpec::text(
                "docs",
                "Array of documents as JSON (include _deleted:true to delete)",
            )
            .json()
            .required("Documents"),
        ],
        handler: bulk_docs,
    },
    ToolDescriptor {
        name: "couchdb_changes",
        description: "Get database changes feed",
        params: &[
            DATABASE,
            ParamSpec::text("since", "Start from this sequence (default: 0)"),
            ParamSpec::text("limit", "Max changes to return").integer(),
            ParamSpec::text("include_docs", "Include document bodies (true/false)").boolean(),
        ],
        handler: changes,
    },
]);

fn database<'a>(adapter: &'a CouchDbAdapter, args: &'a ToolArgs) -> ToolResult<&'a str> {
    args.or_configured("database", &adapter.config().database, "Database name")
}

fn field(body: &Value, name: &str) -> Value {
    body.get(name).cloned().unwrap_or(Value::Null)
}

fn list_len(body: &Value, name: &str) -> usize {
    body.get(name).and_then(Value::as_array).map_or(0, Vec::len)
}

/// The backend's `ok` acknowledgement, `true` when the body carries none.
fn acknowledged(body: &Value) -> Value {
    body.get("ok").cloned().unwrap_or(Value::Bool(true))
}

fn list_databases(adapter: &CouchDbAdapter, _args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let databases = adapter.client().await?.request(request::all_dbs()).await?;
        let count = databases.as_array().map_or(0, Vec::len);
        Ok(json!({ "count": count, "databases": databases }))
    }
    .boxed()
}

fn create_database(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let name = args.required("name")?;
        let result = adapter
            .client()
            .await?
            .request(request::create_database(name))
            .await?;
        Ok(json!({ "success": acknowledged(&result), "database": name, "result": result }))
    }
    .boxed()
}

fn delete_database(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let name = args.required("name")?;
        let result = adapter
            .client()
            .await?
            .request(request::delete_database(name))
            .await?;
        Ok(json!({ "success": acknowledged(&result), "database": name, "result": result }))
    }
    .boxed()
}

fn info(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        adapter.client().await?.request(request::database_info(db)).await
    }
    .boxed()
}

fn all_docs(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let call = request::all_docs(
            db,
            args.flag("include_docs"),
            args.integer_or("limit", ALL_DOCS_LIMIT)?,
            args.integer("skip")?,
        );
        let result = adapter.client().await?.request(call).await?;
        Ok(json!({
            "total_rows": field(&result, "total_rows"),
            "offset": field(&result, "offset"),
            "count": list_len(&result, "rows"),
            "rows": field(&result, "rows"),
        }))
    }
    .boxed()
}

fn get(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let id = args.required("id")?;
        let call = request::get_document(db, id, args.optional("rev"));
        adapter.client().await?.request(call).await
    }
    .boxed()
}

fn insert(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let document: Value = args.required_json("document")?;
        let call = request::insert_document(db, args.optional("id"), document);

        let result = adapter.client().await?.request(call).await?;
        Ok(json!({
            "success": acknowledged(&result),
            "id": field(&result, "id"),
            "rev": field(&result, "rev"),
        }))
    }
    .boxed()
}

fn delete(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let id = args.required("id")?;
        let rev = args.required("rev")?;

        let result = adapter
            .client()
            .await?
            .request(request::delete_document(db, id, rev))
            .await?;
        Ok(json!({
            "success": acknowledged(&result),
            "id": field(&result, "id"),
            "rev": field(&result, "rev"),
        }))
    }
    .boxed()
}

fn find(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let mut query = MangoQuery::new(args.required_json("selector")?);
        if let Some(limit) = args.integer("limit")? {
            query.limit = limit;
        }
        query.fields = args.json("fields")?;
        query.skip = args.integer("skip")?;
        query.sort = args.json("sort")?;

        let result = adapter
            .client()
            .await?
            .request(request::find(db, &query))
            .await?;

        let mut envelope = Map::new();
        envelope.insert("count".to_string(), json!(list_len(&result, "docs")));
        envelope.insert("docs".to_string(), field(&result, "docs"));
        for optional in ["bookmark", "warning"] {
            if let Some(value) = result.get(optional) {
                envelope.insert(optional.to_string(), value.clone());
            }
        }
        Ok(Value::Object(envelope))
    }
    .boxed()
}

fn create_index(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let fields: Value = args.required_json("fields")?;
        let index = MangoIndex {
            index: json!({ "fields": fields }),
            name: args.optional("name").map(str::to_string),
            ddoc: args.optional("ddoc").map(str::to_string),
        };

        let result = adapter
            .client()
            .await?
            .request(request::create_index(db, &index))
            .await?;
        Ok(json!({
            "result": field(&result, "result"),
            "id": field(&result, "id"),
            "name": field(&result, "name"),
        }))
    }
    .boxed()
}

fn view(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let design = args.required("design")?;
        let view_name = args.required("view")?;
        let query = ViewQuery {
            key: args.optional("key"),
            startkey: args.optional("startkey"),
            endkey: args.optional("endkey"),
            limit: args.integer("limit")?,
            include_docs: args.flag("include_docs"),
            skip_reduce: args.optional("reduce") == Some("false"),
            group: args.flag("group"),
        };

        let result = adapter
            .client()
            .await?
            .request(request::view(db, design, view_name, &query))
            .await?;
        Ok(json!({
            "total_rows": field(&result, "total_rows"),
            "offset": field(&result, "offset"),
            "count": list_len(&result, "rows"),
            "rows": field(&result, "rows"),
        }))
    }
    .boxed()
}

fn bulk_docs(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let docs: Value = args.required_json("docs")?;

        let result = adapter
            .client()
            .await?
            .request(request::bulk_docs(db, docs))
            .await?;
        let items = result
            .as_array()
            .ok_or_else(|| ToolError::backend("CouchDB", "unexpected _bulk_docs response"))?;
        let (succeeded, failed) = partition_outcomes(items);

        Ok(json!({
            "total": items.len(),
            "succeeded": succeeded,
            "failed": failed,
            "results": result,
        }))
    }
    .boxed()
}

fn changes(adapter: &CouchDbAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let db = database(adapter, &args)?;
        let call = request::changes(
            db,
            args.optional("since"),
            args.integer_or("limit", CHANGES_LIMIT)?,
            args.flag("include_docs"),
        );
        let result = adapter.client().await?.request(call).await?;
        Ok(json!({
            "last_seq": field(&result, "last_seq"),
            "count": list_len(&result, "results"),
            "results": field(&result, "results"),
        }))
    }
    .boxed()
}
