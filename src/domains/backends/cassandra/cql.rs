//! CQL statement builders.
//!
//! Keyspace, table and column identifiers are spliced into the statement
//! text; values always travel as positional `?` bind markers. Placeholder
//! order follows the key order of the decoded JSON object.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::domains::tools::{ToolError, ToolResult};

/// A CQL statement with its positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub query: String,
    pub values: Vec<Value>,
}

impl Statement {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            values: Vec::new(),
        }
    }

    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }
}

fn qualified(keyspace: &str, table: &str) -> String {
    format!("{}.{}", keyspace, table)
}

fn assignments(columns: &Map<String, Value>) -> Vec<String> {
    columns.keys().map(|col| format!("{} = ?", col)).collect()
}

pub fn insert(keyspace: &str, table: &str, data: &Map<String, Value>, ttl: Option<i64>) -> Statement {
    let columns: Vec<&str> = data.keys().map(String::as_str).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");

    let mut query = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified(keyspace, table),
        columns.join(", "),
        placeholders
    );
    if let Some(ttl) = ttl {
        query.push_str(&format!(" USING TTL {}", ttl));
    }

    Statement::new(query).with_values(data.values().cloned().collect())
}

pub fn update(
    keyspace: &str,
    table: &str,
    set: &Map<String, Value>,
    filter: &Map<String, Value>,
) -> Statement {
    let query = format!(
        "UPDATE {} SET {} WHERE {}",
        qualified(keyspace, table),
        assignments(set).join(", "),
        assignments(filter).join(" AND ")
    );
    let values = set.values().chain(filter.values()).cloned().collect();
    Statement::new(query).with_values(values)
}

pub fn delete(keyspace: &str, table: &str, filter: &Map<String, Value>) -> Statement {
    let query = format!(
        "DELETE FROM {} WHERE {}",
        qualified(keyspace, table),
        assignments(filter).join(" AND ")
    );
    Statement::new(query).with_values(filter.values().cloned().collect())
}

/// Keyspace replication strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplicationStrategy {
    #[default]
    Simple,
    NetworkTopology,
}

impl ReplicationStrategy {
    pub fn parse(raw: Option<&str>) -> ToolResult<Self> {
        raw.map_or(Ok(Self::default()), str::parse)
    }

    /// Replication map literal for `CREATE KEYSPACE`.
    pub fn replication(self, factor: i64, datacenter: &str) -> String {
        match self {
            Self::Simple => format!(
                "{{'class': 'SimpleStrategy', 'replication_factor': {}}}",
                factor
            ),
            Self::NetworkTopology => format!(
                "{{'class': 'NetworkTopologyStrategy', '{}': {}}}",
                datacenter, factor
            ),
        }
    }
}

impl fmt::Display for ReplicationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simple => "SimpleStrategy",
            Self::NetworkTopology => "NetworkTopologyStrategy",
        })
    }
}

impl FromStr for ReplicationStrategy {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SimpleStrategy" => Ok(Self::Simple),
            "NetworkTopologyStrategy" => Ok(Self::NetworkTopology),
            _ => Err(ToolError::translation(format!(
                "Unknown replication strategy: {}",
                s
            ))),
        }
    }
}

pub fn create_keyspace(
    name: &str,
    strategy: ReplicationStrategy,
    factor: i64,
    datacenter: &str,
) -> Statement {
    Statement::new(format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {}",
        name,
        strategy.replication(factor, datacenter)
    ))
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Key expression for `PRIMARY KEY (...)`.
///
/// A JSON array becomes a parenthesised composite; anything else is used
/// verbatim.
pub fn primary_key_clause(raw: &str) -> String {
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(parts) => format!(
            "({})",
            parts.iter().map(plain).collect::<Vec<_>>().join(", ")
        ),
        Err(_) => raw.to_string(),
    }
}

pub fn create_table(
    keyspace: &str,
    table: &str,
    columns: &Map<String, Value>,
    primary_key: &str,
) -> Statement {
    let definitions: Vec<String> = columns
        .iter()
        .map(|(name, kind)| format!("{} {}", name, plain(kind)))
        .collect();

    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}))",
        qualified(keyspace, table),
        definitions.join(", "),
        primary_key_clause(primary_key)
    ))
}

pub fn drop_table(keyspace: &str, table: &str) -> Statement {
    Statement::new(format!("DROP TABLE IF EXISTS {}", qualified(keyspace, table)))
}

/// Batch items: bare query strings or `{query, params}` objects.
pub fn batch_statements(items: Vec<Value>) -> ToolResult<Vec<Statement>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::String(query) => Ok(Statement::new(query)),
            Value::Object(mut fields) => {
                let query = match fields.remove("query") {
                    Some(Value::String(query)) => query,
                    _ => {
                        return Err(ToolError::invalid_arguments(
                            "batch statement objects need a 'query' string",
                        ));
                    }
                };
                let values = match fields.remove("params") {
                    Some(Value::Array(values)) => values,
                    None | Some(Value::Null) => Vec::new(),
                    Some(_) => {
                        return Err(ToolError::invalid_arguments(
                            "batch statement 'params' must be an array",
                        ));
                    }
                };
                Ok(Statement::new(query).with_values(values))
            }
            other => Err(ToolError::invalid_arguments(format!(
                "unsupported batch statement: {}",
                other
            ))),
        })
        .collect()
}

pub const RELEASE_VERSION: &str = "SELECT release_version FROM system.local";

pub fn list_keyspaces() -> Statement {
    Statement::new("SELECT keyspace_name, replication FROM system_schema.keyspaces")
}

pub fn list_tables(keyspace: &str) -> Statement {
    Statement::new("SELECT table_name FROM system_schema.tables WHERE keyspace_name = ?")
        .with_values(vec![Value::from(keyspace)])
}

pub fn table_columns(keyspace: &str, table: &str) -> Statement {
    Statement::new(
        "SELECT column_name, type, kind, position FROM system_schema.columns \
         WHERE keyspace_name = ? AND table_name = ?",
    )
    .with_values(vec![Value::from(keyspace), Value::from(table)])
}

pub fn table_options(keyspace: &str, table: &str) -> Statement {
    Statement::new(
        "SELECT bloom_filter_fp_chance, caching, comment, compaction, compression \
         FROM system_schema.tables WHERE keyspace_name = ? AND table_name = ?",
    )
    .with_values(vec![Value::from(keyspace), Value::from(table)])
}

pub fn local_node() -> Statement {
    Statement::new("SELECT cluster_name, release_version, data_center, rack FROM system.local")
}

pub fn peers() -> Statement {
    Statement::new("SELECT peer, data_center, rack, release_version FROM system.peers")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_insert_with_ttl() {
        let data = object(json!({ "id": "1", "name": "x" }));
        let statement = insert("ks", "table", &data, Some(60));
        assert_eq!(
            statement.query,
            "INSERT INTO ks.table (id, name) VALUES (?, ?) USING TTL 60"
        );
        assert_eq!(statement.values, vec![json!("1"), json!("x")]);
    }

    #[test]
    fn test_insert_keeps_key_order() {
        let data: Map<String, Value> = serde_json::from_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let statement = insert("ks", "t", &data, None);
        assert_eq!(statement.query, "INSERT INTO ks.t (z, a, m) VALUES (?, ?, ?)");
        assert_eq!(statement.values, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_update_values_set_then_where() {
        let set = object(json!({ "name": "bob", "age": 4 }));
        let filter = object(json!({ "id": "7", "tenant": "a" }));
        let statement = update("ks", "users", &set, &filter);
        assert_eq!(
            statement.query,
            "UPDATE ks.users SET name = ?, age = ? WHERE id = ? AND tenant = ?"
        );
        assert_eq!(
            statement.values,
            vec![json!("bob"), json!(4), json!("7"), json!("a")]
        );
    }

    #[test]
    fn test_delete() {
        let filter = object(json!({ "id": "7" }));
        assert_eq!(delete("ks", "users", &filter).query, "DELETE FROM ks.users WHERE id = ?");
    }

    #[test]
    fn test_primary_key_clause() {
        assert_eq!(primary_key_clause(r#"["tenant", "id"]"#), "(tenant, id)");
        assert_eq!(primary_key_clause("id"), "id");
        assert_eq!(primary_key_clause("(tenant), id"), "(tenant), id");
    }

    #[test]
    fn test_create_table_composite_key() {
        let columns: Map<String, Value> =
            serde_json::from_str(r#"{"tenant": "text", "id": "uuid", "name": "text"}"#).unwrap();
        let statement = create_table("ks", "users", &columns, r#"["tenant","id"]"#);
        assert_eq!(
            statement.query,
            "CREATE TABLE IF NOT EXISTS ks.users (tenant text, id uuid, name text, PRIMARY KEY ((tenant, id)))"
        );
    }

    #[test]
    fn test_create_keyspace_strategies() {
        let simple = create_keyspace("shop", ReplicationStrategy::Simple, 1, "dc1");
        assert_eq!(
            simple.query,
            "CREATE KEYSPACE IF NOT EXISTS shop WITH replication = {'class': 'SimpleStrategy', 'replication_factor': 1}"
        );
        let topology = create_keyspace("shop", ReplicationStrategy::NetworkTopology, 3, "dc1");
        assert!(topology.query.ends_with("{'class': 'NetworkTopologyStrategy', 'dc1': 3}"));
        assert!(ReplicationStrategy::parse(Some("LocalStrategy")).is_err());
        assert_eq!(ReplicationStrategy::parse(None).unwrap(), ReplicationStrategy::Simple);
    }

    #[test]
    fn test_batch_statements() {
        let items = vec![
            json!("DELETE FROM ks.t WHERE id = '1'"),
            json!({ "query": "INSERT INTO ks.t (id) VALUES (?)", "params": ["2"] }),
        ];
        let statements = batch_statements(items).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].values.is_empty());
        assert_eq!(statements[1].values, vec![json!("2")]);

        assert!(batch_statements(vec![json!(42)]).is_err());
        assert!(batch_statements(vec![json!({ "params": [] })]).is_err());
    }
}
