//! Cassandra tool table.
//!
//! Schema tools qualify names as `keyspace.table`. `cassandra_query` and
//! `cassandra_batch` run unqualified CQL, so their optional `keyspace` picks
//! the session the statements run on.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::CassandraAdapter;
use super::cql::{self, ReplicationStrategy, Statement};
use crate::domains::tools::normalize::{QUERY_CAP, truncate};
use crate::domains::tools::{ParamSpec, ToolArgs, ToolDescriptor, ToolResult, ToolTable};

const KEYSPACE: ParamSpec = ParamSpec::text(
    "keyspace",
    "Keyspace name (uses CASSANDRA_KEYSPACE if not provided)",
);
const TABLE: ParamSpec = ParamSpec::text("table", "Table name").required("Table name");
const WHERE: ParamSpec = ParamSpec::text("where", "WHERE clause conditions as JSON object")
    .json()
    .required("Where conditions");

pub(super) static TOOLS: ToolTable<CassandraAdapter> = ToolTable::new(&[
    ToolDescriptor {
        name: "cassandra_query",
        description: "Execute a CQL query",
        params: &[
            ParamSpec::text("query", "CQL query to execute").required("Query"),
            ParamSpec::text("params", "Query parameters as JSON array (optional)").json(),
            ParamSpec::text(
                "keyspace",
                "Keyspace to use (optional, uses CASSANDRA_KEYSPACE if not provided)",
            ),
        ],
        handler: query,
    },
    ToolDescriptor {
        name: "cassandra_list_keyspaces",
        description: "List all keyspaces",
        params: &[],
        handler: list_keyspaces,
    },
    ToolDescriptor {
        name: "cassandra_list_tables",
        description: "List all tables in a keyspace",
        params: &[KEYSPACE],
        handler: list_tables,
    },
    ToolDescriptor {
        name: "cassandra_describe_table",
        description: "Get table schema information",
        params: &[TABLE, KEYSPACE],
        handler: describe_table,
    },
    ToolDescriptor {
        name: "cassandra_insert",
        description: "Insert a row into a table",
        params: &[
            TABLE,
            ParamSpec::text("data", "Row data as JSON object")
                .json()
                .required("Data"),
            KEYSPACE,
            ParamSpec::text("ttl", "Time-to-live in seconds (optional)").integer(),
        ],
        handler: insert,
    },
    ToolDescriptor {
        name: "cassandra_update",
        description: "Update rows in a table",
        params: &[
            TABLE,
            ParamSpec::text("set", "Values to set as JSON object")
                .json()
                .required("Set values"),
            WHERE,
            KEYSPACE,
        ],
        handler: update,
    },
    ToolDescriptor {
        name: "cassandra_delete",
        description: "Delete rows from a table",
        params: &[TABLE, WHERE, KEYSPACE],
        handler: delete,
    },
    ToolDescriptor {
        name: "cassandra_create_keyspace",
        description: "Create a new keyspace",
        params: &[
            ParamSpec::text("name", "Keyspace name").required("Keyspace name"),
            ParamSpec::text("replication_factor", "Replication factor (default: 1)").integer(),
            ParamSpec::text(
                "strategy",
                "Replication strategy: SimpleStrategy or NetworkTopologyStrategy (default: SimpleStrategy)",
            ),
        ],
        handler: create_keyspace,
    },
    ToolDescriptor {
        name: "cassandra_create_table",
        description: "Create a new table",
        params: &[
            TABLE,
            ParamSpec::text(
                "columns",
                "Column definitions as JSON object (e.g., '{\"id\": \"uuid\", \"name\": \"text\"}')",
            )
            .json()
            .required("Columns"),
            ParamSpec::text(
                "primary_key",
                "Primary key column(s) - single column or JSON array for composite",
            )
            .required("Primary key"),
            KEYSPACE,
        ],
        handler: create_table,
    },
    ToolDescriptor {
        name: "cassandra_drop_table",
        description: "Drop a table",
        params: &[TABLE, KEYSPACE],
        handler: drop_table,
    },
    ToolDescriptor {
        name: "cassandra_batch",
        description: "Execute multiple statements in a batch",
        params: &[
            ParamSpec::text("statements", "Array of CQL statements as JSON")
                .json()
                .required("Statements"),
            KEYSPACE,
        ],
        handler: batch,
    },
    ToolDescriptor {
        name: "cassandra_cluster_info",
        description: "Get cluster information",
        params: &[],
        handler: cluster_info,
    },
]);

/// Keyspace from the arguments or the configured default.
fn keyspace<'a>(adapter: &'a CassandraAdapter, args: &'a ToolArgs) -> ToolResult<&'a str> {
    args.or_configured("keyspace", &adapter.config().keyspace, "Keyspace")
}

fn field(row: &Map<String, Value>, name: &str) -> Value {
    row.get(name).cloned().unwrap_or(Value::Null)
}

fn query(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let text = args.required("query")?;
        let values: Vec<Value> = args.json("params")?.unwrap_or_default();

        let session = adapter.session_in(args.optional("keyspace")).await?;
        let result = session
            .execute(&Statement::new(text).with_values(values))
            .await?;

        let columns: Vec<Value> = result
            .columns
            .iter()
            .map(|c| json!({ "name": c.name, "type": c.type_name }))
            .collect();
        let row_count = result.len();
        let rows = truncate(result.rows.into_iter().map(Value::Object).collect(), QUERY_CAP);

        Ok(json!({ "rowCount": row_count, "columns": columns, "rows": rows }))
    }
    .boxed()
}

fn list_keyspaces(adapter: &CassandraAdapter, _args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let result = adapter.session().await?.execute(&cql::list_keyspaces()).await?;
        let keyspaces: Vec<Value> = result
            .rows
            .iter()
            .map(|row| {
                json!({
                    "name": field(row, "keyspace_name"),
                    "replication": field(row, "replication"),
                })
            })
            .collect();
        Ok(json!({ "count": keyspaces.len(), "keyspaces": keyspaces }))
    }
    .boxed()
}

fn list_tables(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let ks = keyspace(adapter, &args)?;
        let result = adapter.session().await?.execute(&cql::list_tables(ks)).await?;
        let tables: Vec<Value> = result.rows.iter().map(|row| field(row, "table_name")).collect();
        Ok(json!({ "keyspace": ks, "count": tables.len(), "tables": tables }))
    }
    .boxed()
}

fn describe_table(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let ks = keyspace(adapter, &args)?;
        let table = args.required("table")?;
        let session = adapter.session().await?;

        let column_rows = session.execute(&cql::table_columns(ks, table)).await?;
        let columns: Vec<Value> = column_rows
            .rows
            .iter()
            .map(|row| {
                json!({
                    "name": field(row, "column_name"),
                    "type": field(row, "type"),
                    "kind": field(row, "kind"),
                    "position": field(row, "position"),
                })
            })
            .collect();

        let options = session.execute(&cql::table_options(ks, table)).await?;
        let metadata = options.first().cloned().unwrap_or_default();

        Ok(json!({
            "keyspace": ks,
            "table": table,
            "columns": columns,
            "metadata": {
                "bloomFilterFpChance": field(&metadata, "bloom_filter_fp_chance"),
                "caching": field(&metadata, "caching"),
                "comment": field(&metadata, "comment"),
                "compaction": field(&metadata, "compaction"),
                "compression": field(&metadata, "compression"),
            },
        }))
    }
    .boxed()
}

fn insert(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let ks = keyspace(adapter, &args)?;
        let table = args.required("table")?;
        let data: Map<String, Value> = args.required_json("data")?;
        let ttl = args.integer("ttl")?;

        let statement = cql::insert(ks, table, &data, ttl);
        adapter.session().await?.execute(&statement).await?;

        let columns: Vec<&String> = data.keys().collect();
        Ok(json!({ "success": true, "table": format!("{}.{}", ks, table), "columns": columns }))
    }
    .boxed()
}

fn update(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let ks = keyspace(adapter, &args)?;
        let table = args.required("table")?;
        args.required("set")?;
        args.required("where")?;
        let set: Map<String, Value> = args.required_json("set")?;
        let filter: Map<String, Value> = args.required_json("where")?;

        let statement = cql::update(ks, table, &set, &filter);
        adapter.session().await?.execute(&statement).await?;
        Ok(json!({ "success": true, "table": format!("{}.{}", ks, table) }))
    }
    .boxed()
}

fn delete(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let ks = keyspace(adapter, &args)?;
        let table = args.required("table")?;
        let filter: Map<String, Value> = args.required_json("where")?;

        let statement = cql::delete(ks, table, &filter);
        adapter.session().await?.execute(&statement).await?;
        Ok(json!({ "success": true, "table": format!("{}.{}", ks, table) }))
    }
    .boxed()
}

fn create_keyspace(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let name = args.required("name")?;
        let factor = args.integer_or("replication_factor", 1)?;
        let strategy = ReplicationStrategy::parse(args.optional("strategy"))?;

        let statement = cql::create_keyspace(name, strategy, factor, &adapter.config().datacenter);
        adapter.session().await?.execute(&statement).await?;
        Ok(json!({
            "success": true,
            "keyspace": name,
            "strategy": strategy.to_string(),
            "replicationFactor": factor,
        }))
    }
    .boxed()
}

fn create_table(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let ks = keyspace(adapter, &args)?;
        let table = args.required("table")?;
        args.required("columns")?;
        let primary_key = args.required("primary_key")?;
        let columns: Map<String, Value> = args.required_json("columns")?;

        let statement = cql::create_table(ks, table, &columns, primary_key);
        adapter.session().await?.execute(&statement).await?;
        Ok(json!({ "success": true, "table": format!("{}.{}", ks, table) }))
    }
    .boxed()
}

fn drop_table(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let ks = keyspace(adapter, &args)?;
        let table = args.required("table")?;
        adapter.session().await?.execute(&cql::drop_table(ks, table)).await?;
        Ok(json!({ "success": true, "table": format!("{}.{}", ks, table), "dropped": true }))
    }
    .boxed()
}

fn batch(adapter: &CassandraAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let items: Vec<Value> = args.required_json("statements")?;
        let statements = cql::batch_statements(items)?;

        let session = adapter.session_in(args.optional("keyspace")).await?;
        session.batch(&statements).await?;
        Ok(json!({ "success": true, "statementCount": statements.len() }))
    }
    .boxed()
}

fn cluster_info(adapter: &CassandraAdapter, _args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let session = adapter.session().await?;
        let local = session.execute(&cql::local_node()).await?;
        let local = local.first().cloned().unwrap_or_default();
        let peers = session.execute(&cql::peers()).await?;

        let peer_list: Vec<Value> = peers
            .rows
            .iter()
            .map(|row| {
                json!({
                    "peer": field(row, "peer"),
                    "dataCenter": field(row, "data_center"),
                    "rack": field(row, "rack"),
                    "version": field(row, "release_version"),
                })
            })
            .collect();

        Ok(json!({
            "cluster": field(&local, "cluster_name"),
            "version": field(&local, "release_version"),
            "localDataCenter": field(&local, "data_center"),
            "localRack": field(&local, "rack"),
            "peers": peer_list,
            "totalNodes": 1 + peers.len(),
        }))
    }
    .boxed()
}
