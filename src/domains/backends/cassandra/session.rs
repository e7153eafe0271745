//! CQL session seam and its `scylla` implementation.
//!
//! Rows come back as JSON objects keyed by column name. Bound values arrive
//! as JSON; statements carrying values are prepared first so each value can
//! be coerced to the column type the server reports for its bind marker.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use scylla::batch::{Batch, BatchType};
use scylla::frame::response::result::{ColumnSpec, ColumnType, CqlValue};
use scylla::frame::value::{Counter, CqlDate, CqlTime, CqlTimestamp};
use scylla::load_balancing::DefaultPolicy;
use scylla::prepared_statement::PreparedStatement;
use scylla::{ExecutionProfile, QueryResult, Session, SessionBuilder};
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use super::cql::Statement;
use crate::core::config::CassandraConfig;
use crate::domains::tools::{ToolError, ToolResult};

const BACKEND: &str = "Cassandra";

fn backend_error(err: impl fmt::Display) -> ToolError {
    ToolError::backend(BACKEND, err.to_string())
}

/// Result column metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CqlColumn {
    pub name: String,
    pub type_name: String,
}

/// Materialised rows of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CqlRows {
    pub columns: Vec<CqlColumn>,
    pub rows: Vec<Map<String, Value>>,
}

impl CqlRows {
    /// Rows built from JSON objects, column names taken from the first row.
    pub fn from_json(rows: Vec<Value>) -> Self {
        let rows: Vec<Map<String, Value>> = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        let columns = rows
            .first()
            .map(|row| {
                row.keys()
                    .map(|name| CqlColumn {
                        name: name.clone(),
                        type_name: "text".to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Map<String, Value>> {
        self.rows.first()
    }
}

#[async_trait]
pub trait CqlSession: Send + Sync {
    async fn execute(&self, statement: &Statement) -> ToolResult<CqlRows>;

    /// Run statements as one logged batch.
    async fn batch(&self, statements: &[Statement]) -> ToolResult<()>;
}

/// Opens sessions bound to `config.keyspace` when it is set.
#[async_trait]
pub trait CqlConnector: Send + Sync {
    async fn connect(&self, config: &CassandraConfig) -> ToolResult<Arc<dyn CqlSession>>;
}

/// Connects through the `scylla` driver.
pub struct ScyllaConnector;

#[async_trait]
impl CqlConnector for ScyllaConnector {
    async fn connect(&self, config: &CassandraConfig) -> ToolResult<Arc<dyn CqlSession>> {
        let policy = DefaultPolicy::builder()
            .prefer_datacenter(config.datacenter.clone())
            .build();
        let profile = ExecutionProfile::builder()
            .load_balancing_policy(policy)
            .build();

        let mut builder = SessionBuilder::new()
            .known_nodes(&config.contact_points)
            .default_execution_profile_handle(profile.into_handle());
        if !config.username.is_empty() && !config.password.is_empty() {
            builder = builder.user(&config.username, &config.password);
        }
        if let Some(keyspace) = config.default_keyspace() {
            builder = builder.use_keyspace(keyspace, false);
        }

        let session = builder.build().await.map_err(backend_error)?;
        info!(
            "Connected to Cassandra via {:?} (datacenter {})",
            config.contact_points, config.datacenter
        );
        Ok(Arc::new(ScyllaSession { session }))
    }
}

pub struct ScyllaSession {
    session: Session,
}

impl ScyllaSession {
    async fn bound_values(
        &self,
        statement: &Statement,
    ) -> ToolResult<(PreparedStatement, Vec<Option<CqlValue>>)> {
        let prepared = self
            .session
            .prepare(statement.query.as_str())
            .await
            .map_err(backend_error)?;
        let values = bind(&statement.values, prepared.get_variable_col_specs())?;
        Ok((prepared, values))
    }
}

#[async_trait]
impl CqlSession for ScyllaSession {
    async fn execute(&self, statement: &Statement) -> ToolResult<CqlRows> {
        debug!("CQL {}", statement.query);
        let result = if statement.values.is_empty() {
            self.session
                .query_unpaged(statement.query.as_str(), ())
                .await
        } else {
            let (prepared, values) = self.bound_values(statement).await?;
            self.session.execute_unpaged(&prepared, values).await
        };
        Ok(rows_to_json(result.map_err(backend_error)?))
    }

    async fn batch(&self, statements: &[Statement]) -> ToolResult<()> {
        let mut batch = Batch::new(BatchType::Logged);
        let mut values = Vec::with_capacity(statements.len());
        for statement in statements {
            let (prepared, bound) = self.bound_values(statement).await?;
            batch.append_statement(prepared);
            values.push(bound);
        }
        self.session
            .batch(&batch, values)
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}

fn rows_to_json(result: QueryResult) -> CqlRows {
    let columns: Vec<CqlColumn> = result
        .col_specs()
        .iter()
        .map(|spec| CqlColumn {
            name: spec.name.clone(),
            type_name: type_name(&spec.typ),
        })
        .collect();

    let rows = result
        .rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .zip(row.columns)
                .map(|(column, value)| {
                    (
                        column.name.clone(),
                        value.as_ref().map_or(Value::Null, cql_to_json),
                    )
                })
                .collect()
        })
        .collect();

    CqlRows { columns, rows }
}

/// CQL type name as written in a schema.
pub fn type_name(typ: &ColumnType) -> String {
    match typ {
        ColumnType::Custom(name) => name.to_string(),
        ColumnType::Ascii => "ascii".into(),
        ColumnType::Boolean => "boolean".into(),
        ColumnType::Blob => "blob".into(),
        ColumnType::Counter => "counter".into(),
        ColumnType::Date => "date".into(),
        ColumnType::Decimal => "decimal".into(),
        ColumnType::Double => "double".into(),
        ColumnType::Duration => "duration".into(),
        ColumnType::Float => "float".into(),
        ColumnType::Int => "int".into(),
        ColumnType::BigInt => "bigint".into(),
        ColumnType::Text => "text".into(),
        ColumnType::Timestamp => "timestamp".into(),
        ColumnType::Inet => "inet".into(),
        ColumnType::List(inner) => format!("list<{}>", type_name(inner)),
        ColumnType::Set(inner) => format!("set<{}>", type_name(inner)),
        ColumnType::Map(key, value) => format!("map<{}, {}>", type_name(key), type_name(value)),
        ColumnType::SmallInt => "smallint".into(),
        ColumnType::TinyInt => "tinyint".into(),
        ColumnType::Time => "time".into(),
        ColumnType::Timeuuid => "timeuuid".into(),
        ColumnType::Uuid => "uuid".into(),
        ColumnType::Varint => "varint".into(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

fn cql_to_json(value: &CqlValue) -> Value {
    match value {
        CqlValue::Ascii(s) | CqlValue::Text(s) => Value::String(s.clone()),
        CqlValue::Boolean(b) => Value::Bool(*b),
        CqlValue::TinyInt(n) => Value::from(*n),
        CqlValue::SmallInt(n) => Value::from(*n),
        CqlValue::Int(n) => Value::from(*n),
        CqlValue::BigInt(n) => Value::from(*n),
        CqlValue::Counter(Counter(n)) => Value::from(*n),
        CqlValue::Float(f) => Number::from_f64(f64::from(*f)).map_or(Value::Null, Value::Number),
        CqlValue::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        CqlValue::Timestamp(CqlTimestamp(ms)) => Value::from(*ms),
        CqlValue::Date(CqlDate(days)) => Value::from(*days),
        CqlValue::Time(CqlTime(nanos)) => Value::from(*nanos),
        CqlValue::Uuid(id) => Value::String(id.to_string()),
        CqlValue::Inet(addr) => Value::String(addr.to_string()),
        CqlValue::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
        CqlValue::List(items) | CqlValue::Set(items) => {
            Value::Array(items.iter().map(cql_to_json).collect())
        }
        CqlValue::Tuple(items) => Value::Array(
            items
                .iter()
                .map(|item| item.as_ref().map_or(Value::Null, cql_to_json))
                .collect(),
        ),
        CqlValue::Map(pairs) => map_to_json(pairs),
        CqlValue::UserDefinedType { fields, .. } => Value::Object(
            fields
                .iter()
                .map(|(name, value)| {
                    (name.clone(), value.as_ref().map_or(Value::Null, cql_to_json))
                })
                .collect(),
        ),
        CqlValue::Empty => Value::Null,
        other => Value::String(format!("{:?}", other)),
    }
}

fn map_to_json(pairs: &[(CqlValue, CqlValue)]) -> Value {
    let text_keys = pairs
        .iter()
        .all(|(k, _)| matches!(k, CqlValue::Text(_) | CqlValue::Ascii(_)));
    if text_keys {
        Value::Object(
            pairs
                .iter()
                .filter_map(|(k, v)| match k {
                    CqlValue::Text(key) | CqlValue::Ascii(key) => Some((key.clone(), cql_to_json(v))),
                    _ => None,
                })
                .collect(),
        )
    } else {
        Value::Array(
            pairs
                .iter()
                .map(|(k, v)| Value::Array(vec![cql_to_json(k), cql_to_json(v)]))
                .collect(),
        )
    }
}

/// Coerce JSON values to the types of the statement's bind markers.
fn bind(values: &[Value], specs: &[ColumnSpec]) -> ToolResult<Vec<Option<CqlValue>>> {
    if values.len() != specs.len() {
        return Err(ToolError::invalid_arguments(format!(
            "statement expects {} values, got {}",
            specs.len(),
            values.len()
        )));
    }
    values
        .iter()
        .zip(specs)
        .map(|(value, spec)| match value {
            Value::Null => Ok(None),
            other => json_to_cql(other, &spec.typ).map(Some),
        })
        .collect()
}

fn mismatch(value: &Value, typ: &ColumnType) -> ToolError {
    ToolError::invalid_arguments(format!(
        "cannot bind {} as {}",
        value,
        type_name(typ)
    ))
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_to_cql(value: &Value, typ: &ColumnType) -> ToolResult<CqlValue> {
    let fail = || mismatch(value, typ);
    let integer = || as_integer(value).ok_or_else(fail);

    Ok(match typ {
        ColumnType::Ascii => CqlValue::Ascii(as_text(value)),
        ColumnType::Text => CqlValue::Text(as_text(value)),
        ColumnType::Boolean => match value {
            Value::Bool(b) => CqlValue::Boolean(*b),
            Value::String(s) if s == "true" || s == "false" => CqlValue::Boolean(s == "true"),
            _ => return Err(fail()),
        },
        ColumnType::TinyInt => CqlValue::TinyInt(i8::try_from(integer()?).map_err(|_| fail())?),
        ColumnType::SmallInt => CqlValue::SmallInt(i16::try_from(integer()?).map_err(|_| fail())?),
        ColumnType::Int => CqlValue::Int(i32::try_from(integer()?).map_err(|_| fail())?),
        ColumnType::BigInt => CqlValue::BigInt(integer()?),
        ColumnType::Counter => CqlValue::Counter(Counter(integer()?)),
        ColumnType::Timestamp => CqlValue::Timestamp(CqlTimestamp(integer()?)),
        ColumnType::Float => CqlValue::Float(as_float(value).ok_or_else(fail)? as f32),
        ColumnType::Double => CqlValue::Double(as_float(value).ok_or_else(fail)?),
        ColumnType::Uuid => {
            let id = value
                .as_str()
                .and_then(|s| uuid::Uuid::parse_str(s).ok())
                .ok_or_else(fail)?;
            CqlValue::Uuid(id)
        }
        ColumnType::Inet => {
            let addr = value
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(fail)?;
            CqlValue::Inet(addr)
        }
        ColumnType::Blob => {
            let bytes = value
                .as_str()
                .and_then(|s| STANDARD.decode(s).ok())
                .ok_or_else(fail)?;
            CqlValue::Blob(bytes)
        }
        ColumnType::List(inner) | ColumnType::Set(inner) => {
            let items = value
                .as_array()
                .ok_or_else(fail)?
                .iter()
                .map(|item| json_to_cql(item, inner))
                .collect::<ToolResult<Vec<_>>>()?;
            if matches!(typ, ColumnType::Set(_)) {
                CqlValue::Set(items)
            } else {
                CqlValue::List(items)
            }
        }
        ColumnType::Map(key_type, value_type) => {
            let pairs = value
                .as_object()
                .ok_or_else(fail)?
                .iter()
                .map(|(k, v)| {
                    Ok((
                        json_to_cql(&Value::String(k.clone()), key_type)?,
                        json_to_cql(v, value_type)?,
                    ))
                })
                .collect::<ToolResult<Vec<_>>>()?;
            CqlValue::Map(pairs)
        }
        _ => return Err(fail()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_cql_scalars() {
        assert_eq!(
            json_to_cql(&json!("42"), &ColumnType::Int).unwrap(),
            CqlValue::Int(42)
        );
        assert_eq!(
            json_to_cql(&json!(7), &ColumnType::Text).unwrap(),
            CqlValue::Text("7".to_string())
        );
        assert_eq!(
            json_to_cql(&json!("true"), &ColumnType::Boolean).unwrap(),
            CqlValue::Boolean(true)
        );
        assert!(json_to_cql(&json!("abc"), &ColumnType::BigInt).is_err());
        assert!(json_to_cql(&json!(300), &ColumnType::TinyInt).is_err());
    }

    #[test]
    fn test_json_to_cql_uuid() {
        let id = "6f1c1b2e-8a0c-4c3f-9a7e-0d6a3c1b2e4f";
        assert_eq!(
            json_to_cql(&json!(id), &ColumnType::Uuid).unwrap(),
            CqlValue::Uuid(uuid::Uuid::parse_str(id).unwrap())
        );
        assert!(json_to_cql(&json!("not-a-uuid"), &ColumnType::Uuid).is_err());
    }

    #[test]
    fn test_json_to_cql_collections() {
        let list = ColumnType::List(Box::new(ColumnType::Int));
        assert_eq!(
            json_to_cql(&json!([1, 2]), &list).unwrap(),
            CqlValue::List(vec![CqlValue::Int(1), CqlValue::Int(2)])
        );
        let map = ColumnType::Map(Box::new(ColumnType::Text), Box::new(ColumnType::Text));
        assert_eq!(
            json_to_cql(&json!({ "class": "SimpleStrategy" }), &map).unwrap(),
            CqlValue::Map(vec![(
                CqlValue::Text("class".to_string()),
                CqlValue::Text("SimpleStrategy".to_string())
            )])
        );
    }

    #[test]
    fn test_cql_to_json() {
        let replication = CqlValue::Map(vec![(
            CqlValue::Text("replication_factor".to_string()),
            CqlValue::Text("1".to_string()),
        )]);
        assert_eq!(cql_to_json(&replication), json!({ "replication_factor": "1" }));
        assert_eq!(cql_to_json(&CqlValue::Timestamp(CqlTimestamp(1_700_000_000_000))), json!(1_700_000_000_000i64));
        assert_eq!(cql_to_json(&CqlValue::Blob(b"hi".to_vec())), json!("aGk="));
        assert_eq!(cql_to_json(&CqlValue::Empty), Value::Null);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(&ColumnType::Text), "text");
        let map = ColumnType::Map(Box::new(ColumnType::Text), Box::new(ColumnType::Int));
        assert_eq!(type_name(&map), "map<text, int>");
    }

    #[test]
    fn test_rows_from_json() {
        let rows = CqlRows::from_json(vec![json!({ "keyspace_name": "shop" })]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.columns[0].name, "keyspace_name");
    }
}
