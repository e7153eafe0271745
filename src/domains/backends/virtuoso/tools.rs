//! Virtuoso tool table.
//!
//! Query tools flatten SPARQL JSON bindings into plain rows. Mutations build
//! their update text in `sparql.rs` and report `success` once Virtuoso
//! accepts it.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::VirtuosoAdapter;
use super::sparql::{self, RdfFormat, SEARCH_LIMIT, SELECT_LIMIT};
use crate::domains::tools::normalize::{
    binding_rows, binding_value, count_value, counted, flatten_bindings,
};
use crate::domains::tools::params::parse_leading_int;
use crate::domains::tools::{
    ParamSpec, ToolArgs, ToolDescriptor, ToolError, ToolResult, ToolTable,
};

const QUERY: &str = "query";
const FORMAT: ParamSpec = ParamSpec::text(
    "format",
    "Output format: turtle, ntriples, rdfxml, jsonld (default: turtle)",
);
const OPTIONAL_GRAPH: ParamSpec = ParamSpec::text("graph", "Graph URI (optional)");
const TARGET_GRAPH: ParamSpec = ParamSpec::text("graph", "Target graph URI (optional)");

pub(super) static TOOLS: ToolTable<VirtuosoAdapter> = ToolTable::new(&[
    ToolDescriptor {
        name: "virtuoso_select",
        description: "Execute SPARQL SELECT query",
        params: &[
            ParamSpec::text(QUERY, "SPARQL SELECT query").required("Query"),
            ParamSpec::text("limit", "Max results (default 100)").integer(),
        ],
        handler: select,
    },
    ToolDescriptor {
        name: "virtuoso_ask",
        description: "Execute SPARQL ASK query (returns boolean)",
        params: &[ParamSpec::text(QUERY, "SPARQL ASK query").required("Query")],
        handler: ask,
    },
    ToolDescriptor {
        name: "virtuoso_construct",
        description: "Execute SPARQL CONSTRUCT query",
        params: &[
            ParamSpec::text(QUERY, "SPARQL CONSTRUCT query").required("Query"),
            FORMAT,
        ],
        handler: construct,
    },
    ToolDescriptor {
        name: "virtuoso_describe",
        description: "Describe an RDF resource",
        params: &[
            ParamSpec::text("uri", "URI of resource to describe").required("URI"),
            FORMAT,
        ],
        handler: describe,
    },
    ToolDescriptor {
        name: "virtuoso_insert",
        description: "Insert RDF triples",
        params: &[
            ParamSpec::text("triples", "Triples in Turtle format (e.g., '<s> <p> <o> .')")
                .required("Triples"),
            TARGET_GRAPH,
        ],
        handler: insert,
    },
    ToolDescriptor {
        name: "virtuoso_delete",
        description: "Delete RDF triples",
        params: &[
            ParamSpec::text("triples", "Triples pattern in Turtle format").required("Triples"),
            TARGET_GRAPH,
        ],
        handler: delete,
    },
    ToolDescriptor {
        name: "virtuoso_update",
        description: "Execute generic SPARQL UPDATE query",
        params: &[ParamSpec::text(QUERY, "SPARQL UPDATE query").required("Query")],
        handler: update,
    },
    ToolDescriptor {
        name: "virtuoso_list_graphs",
        description: "List all named graphs with triple counts",
        params: &[],
        handler: list_graphs,
    },
    ToolDescriptor {
        name: "virtuoso_graph_stats",
        description: "Get statistics for a graph (triple count, top predicates, top classes)",
        params: &[ParamSpec::text(
            "graph",
            "Graph URI (optional, uses default graph if empty)",
        )],
        handler: graph_stats,
    },
    ToolDescriptor {
        name: "virtuoso_find_by_type",
        description: "Find resources by RDF type",
        params: &[
            ParamSpec::text("type", "RDF type URI").required("Type"),
            OPTIONAL_GRAPH,
            ParamSpec::text("limit", "Max results (default 50)").integer(),
        ],
        handler: find_by_type,
    },
    ToolDescriptor {
        name: "virtuoso_text_search",
        description: "Full-text search using Virtuoso bif:contains",
        params: &[
            ParamSpec::text("pattern", "Search pattern").required("Pattern"),
            OPTIONAL_GRAPH,
            ParamSpec::text("limit", "Max results (default 50)").integer(),
        ],
        handler: text_search,
    },
    ToolDescriptor {
        name: "virtuoso_list_prefixes",
        description: "List namespaces/prefixes used in the data",
        params: &[],
        handler: list_prefixes,
    },
    ToolDescriptor {
        name: "virtuoso_load_rdf",
        description: "Load RDF data from a URL into a graph",
        params: &[
            ParamSpec::text("url", "URL of RDF data to load").required("URL"),
            ParamSpec::text("graph", "Target graph URI").required("Graph URI"),
        ],
        handler: load_rdf,
    },
    ToolDescriptor {
        name: "virtuoso_clear_graph",
        description: "Clear all triples from a graph",
        params: &[ParamSpec::text("graph", "Graph URI to clear").required("Graph URI")],
        handler: clear_graph,
    },
]);

fn term(row: &Value, var: &str) -> Value {
    binding_value(row, var).map_or(Value::Null, |v| json!(v))
}

fn acknowledged(message: &str, response: &str) -> Value {
    json!({ "success": true, "message": format!("{} {}", message, response) })
}

fn select(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let text = args.required(QUERY)?;
        let limit = args.integer_or("limit", SELECT_LIMIT)?;
        let cap = usize::try_from(limit).map_err(|_| {
            ToolError::invalid_arguments(format!("'limit' must not be negative: {}", limit))
        })?;
        // A caller's own LIMIT is returned in full.
        let cap = if sparql::has_limit(text) { usize::MAX } else { cap };
        let query = sparql::limit_select(text, limit);

        let result = adapter.client().await?.select(&query).await?;
        Ok(match flatten_bindings(&result) {
            Some(rows) => counted("results", rows, cap),
            None => result,
        })
    }
    .boxed()
}

fn ask(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let result = adapter.client().await?.select(args.required(QUERY)?).await?;
        Ok(json!({ "answer": result.get("boolean").cloned().unwrap_or(Value::Null) }))
    }
    .boxed()
}

fn construct(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let query = args.required(QUERY)?;
        let format = RdfFormat::parse(args.optional("format"))?;

        let data = adapter
            .client()
            .await?
            .query(query, format.media_type())
            .await?;
        Ok(json!({ "format": format.name(), "data": data }))
    }
    .boxed()
}

fn describe(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let uri = args.required("uri")?;
        let format = RdfFormat::parse(args.optional("format"))?;

        let data = adapter
            .client()
            .await?
            .query(&sparql::describe(uri), format.media_type())
            .await?;
        Ok(json!({ "uri": uri, "format": format.name(), "data": data }))
    }
    .boxed()
}

fn insert(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let update = sparql::insert_data(args.required("triples")?, args.optional("graph"));
        let response = adapter.client().await?.update(&update).await?;
        Ok(acknowledged("Insert successful.", &response))
    }
    .boxed()
}

fn delete(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let update = sparql::delete_data(args.required("triples")?, args.optional("graph"));
        let response = adapter.client().await?.update(&update).await?;
        Ok(acknowledged("Delete successful.", &response))
    }
    .boxed()
}

fn update(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let response = adapter.client().await?.update(args.required(QUERY)?).await?;
        Ok(acknowledged("Update successful.", &response))
    }
    .boxed()
}

fn list_graphs(adapter: &VirtuosoAdapter, _args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let result = adapter.client().await?.select(&sparql::list_graphs()).await?;
        let graphs: Vec<Value> = binding_rows(&result)
            .iter()
            .map(|row| {
                json!({
                    "graph": term(row, "g"),
                    "triples": count_value(binding_value(row, "triples")),
                })
            })
            .collect();
        Ok(json!({ "count": graphs.len(), "graphs": graphs }))
    }
    .boxed()
}

fn distribution(result: &Value, var: &str, key: &str) -> Vec<Value> {
    binding_rows(result)
        .iter()
        .map(|row| {
            let mut entry = Map::new();
            entry.insert(key.to_string(), term(row, var));
            entry.insert("count".to_string(), count_value(binding_value(row, "count")));
            Value::Object(entry)
        })
        .collect()
}

fn graph_stats(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let graph = args.optional("graph");
        let client = adapter.client().await?;

        let count_query = sparql::triple_count(graph);
        let predicates_query = sparql::top_predicates(graph);
        let classes_query = sparql::top_classes(graph);
        let (count, predicates, classes) = tokio::try_join!(
            client.select(&count_query),
            client.select(&predicates_query),
            client.select(&classes_query),
        )?;

        let triple_count = binding_rows(&count)
            .first()
            .and_then(|row| binding_value(row, "count"))
            .and_then(parse_leading_int)
            .unwrap_or(0);

        Ok(json!({
            "graph": graph.unwrap_or("default"),
            "tripleCount": triple_count,
            "topPredicates": distribution(&predicates, "p", "predicate"),
            "topClasses": distribution(&classes, "class", "class"),
        }))
    }
    .boxed()
}

fn find_by_type(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let query = sparql::find_by_type(
            args.required("type")?,
            args.optional("graph"),
            args.integer_or("limit", SEARCH_LIMIT)?,
        );
        let result = adapter.client().await?.select(&query).await?;

        let resources: Vec<Value> = binding_rows(&result)
            .iter()
            .map(|row| {
                let mut resource = Map::new();
                resource.insert("uri".to_string(), term(row, "resource"));
                if let Some(label) = binding_value(row, "label") {
                    resource.insert("label".to_string(), json!(label));
                }
                Value::Object(resource)
            })
            .collect();
        Ok(json!({ "count": resources.len(), "resources": resources }))
    }
    .boxed()
}

fn text_search(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let query = sparql::text_search(
            args.required("pattern")?,
            args.optional("graph"),
            args.integer_or("limit", SEARCH_LIMIT)?,
        );
        let result = adapter.client().await?.select(&query).await?;

        let matches: Vec<Value> = binding_rows(&result)
            .iter()
            .map(|row| {
                json!({
                    "subject": term(row, "s"),
                    "predicate": term(row, "p"),
                    "object": term(row, "o"),
                })
            })
            .collect();
        Ok(json!({ "count": matches.len(), "matches": matches }))
    }
    .boxed()
}

fn list_prefixes(adapter: &VirtuosoAdapter, _args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let result = adapter.client().await?.select(&sparql::namespaces()).await?;

        let mut namespaces: Vec<&str> = Vec::new();
        for namespace in binding_rows(&result)
            .iter()
            .filter_map(|row| binding_value(row, "namespace"))
            .filter(|ns| !ns.is_empty())
        {
            if !namespaces.contains(&namespace) {
                namespaces.push(namespace);
            }
        }
        Ok(json!({ "count": namespaces.len(), "namespaces": namespaces }))
    }
    .boxed()
}

fn load_rdf(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let update = sparql::load(args.required("url")?, args.required("graph")?);
        let response = adapter.client().await?.update(&update).await?;
        Ok(acknowledged("Load successful.", &response))
    }
    .boxed()
}

fn clear_graph(adapter: &VirtuosoAdapter, args: ToolArgs) -> BoxFuture<'_, ToolResult<Value>> {
    async move {
        let update = sparql::clear_graph(args.required("graph")?);
        let response = adapter.client().await?.update(&update).await?;
        Ok(acknowledged("Graph cleared.", &response))
    }
    .boxed()
}
