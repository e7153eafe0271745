//! AQL and REST call builders for ArangoDB.
//!
//! Traversals are the one place where values travel as genuine bind
//! variables: the start vertex and edge collection are never spliced into
//! the query text, only the validated depth range and direction keyword are.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::domains::backends::http::ApiCall;
use crate::domains::tools::{ToolError, ToolResult};

/// AQL text plus its bind variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AqlQuery {
    pub query: String,
    pub bind_vars: Map<String, Value>,
}

impl AqlQuery {
    pub fn new(query: impl Into<String>, bind_vars: Map<String, Value>) -> Self {
        Self {
            query: query.into(),
            bind_vars,
        }
    }

    /// Cursor creation call for this query.
    pub fn cursor_call(&self) -> ApiCall {
        ApiCall::post(
            &["_api", "cursor"],
            json!({ "query": self.query, "bindVars": self.bind_vars }),
        )
    }
}

/// Traversal direction keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Outbound,
    Inbound,
    Any,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Outbound => "OUTBOUND",
            Self::Inbound => "INBOUND",
            Self::Any => "ANY",
        }
    }

    /// Case-insensitive parse; `None` means the default.
    pub fn parse(raw: Option<&str>) -> ToolResult<Self> {
        match raw {
            None => Ok(Self::default()),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for Direction {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OUTBOUND" => Ok(Self::Outbound),
            "INBOUND" => Ok(Self::Inbound),
            "ANY" => Ok(Self::Any),
            _ => Err(ToolError::translation(format!(
                "Unknown traversal direction: {}",
                s
            ))),
        }
    }
}

/// A depth-bounded traversal from one vertex over one edge collection.
#[derive(Debug, Clone)]
pub struct Traversal<'a> {
    pub start_vertex: &'a str,
    pub edge_collection: &'a str,
    pub direction: Direction,
    pub min_depth: i64,
    pub max_depth: i64,
}

impl Traversal<'_> {
    pub fn to_query(&self) -> AqlQuery {
        let query = format!(
            "FOR v, e, p IN {}..{} {} @start @@edges\nRETURN {{ vertex: v, edge: e }}",
            self.min_depth,
            self.max_depth,
            self.direction.keyword()
        );

        let mut bind_vars = Map::new();
        bind_vars.insert("start".to_string(), json!(self.start_vertex));
        bind_vars.insert("@edges".to_string(), json!(self.edge_collection));
        AqlQuery::new(query, bind_vars)
    }
}

/// Collection kind, with the REST type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionKind {
    #[default]
    Document,
    Edge,
}

impl CollectionKind {
    pub fn code(self) -> u8 {
        match self {
            Self::Document => 2,
            Self::Edge => 3,
        }
    }

    pub fn from_code(code: Option<u64>) -> Self {
        if code == Some(2) {
            Self::Document
        } else {
            Self::Edge
        }
    }

    pub fn parse(raw: Option<&str>) -> ToolResult<Self> {
        match raw {
            None => Ok(Self::default()),
            Some(value) => value.parse(),
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Document => "document",
            Self::Edge => "edge",
        })
    }
}

impl FromStr for CollectionKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "edge" => Ok(Self::Edge),
            _ => Err(ToolError::translation(format!("Unknown collection type: {}", s))),
        }
    }
}

/// Index kinds accepted by `arango_create_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Persistent,
    Hash,
    Skiplist,
    Fulltext,
    Geo,
}

impl IndexKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::Hash => "hash",
            Self::Skiplist => "skiplist",
            Self::Fulltext => "fulltext",
            Self::Geo => "geo",
        }
    }

    /// Whether the kind carries a uniqueness constraint at all.
    pub fn supports_unique(self) -> bool {
        matches!(self, Self::Persistent | Self::Hash | Self::Skiplist)
    }
}

impl FromStr for IndexKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "persistent" => Ok(Self::Persistent),
            "hash" => Ok(Self::Hash),
            "skiplist" => Ok(Self::Skiplist),
            "fulltext" => Ok(Self::Fulltext),
            "geo" => Ok(Self::Geo),
            _ => Err(ToolError::translation(format!("Unknown index type: {}", s))),
        }
    }
}

/// Split a comma-separated field list, trimming each entry.
pub fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',').map(|f| f.trim().to_string()).collect()
}

/// Index definition body; `unique` is dropped for kinds without uniqueness.
pub fn index_definition(kind: IndexKind, fields: &[String], unique: bool) -> Value {
    let mut body = json!({ "type": kind.as_str(), "fields": fields });
    if kind.supports_unique() {
        body["unique"] = json!(unique);
    }
    body
}

pub fn create_index(collection: &str, kind: IndexKind, fields: &[String], unique: bool) -> ApiCall {
    ApiCall::post(&["_api", "index"], index_definition(kind, fields, unique))
        .with_query("collection", collection)
}

pub fn create_collection(name: &str, kind: CollectionKind) -> ApiCall {
    ApiCall::post(
        &["_api", "collection"],
        json!({ "name": name, "type": kind.code() }),
    )
}

pub fn list_databases() -> ApiCall {
    ApiCall::get(&["_api", "database"])
}

pub fn list_graphs() -> ApiCall {
    ApiCall::get(&["_api", "gharial"])
}

pub fn list_collections() -> ApiCall {
    ApiCall::get(&["_api", "collection"]).with_query("excludeSystem", "true")
}

pub fn collection_properties(collection: &str) -> ApiCall {
    ApiCall::get(&["_api", "collection", collection, "properties"])
}

pub fn collection_count(collection: &str) -> ApiCall {
    ApiCall::get(&["_api", "collection", collection, "count"])
}

pub fn collection_indexes(collection: &str) -> ApiCall {
    ApiCall::get(&["_api", "index"]).with_query("collection", collection)
}

pub fn insert_document(collection: &str, document: Value) -> ApiCall {
    ApiCall::post(&["_api", "document", collection], document)
}

pub fn get_document(collection: &str, key: &str) -> ApiCall {
    ApiCall::get(&["_api", "document", collection, key])
}

pub fn update_document(collection: &str, key: &str, patch: Value) -> ApiCall {
    ApiCall::new(Method::PATCH, &["_api", "document", collection, key]).with_body(patch)
}

pub fn remove_document(collection: &str, key: &str) -> ApiCall {
    ApiCall::new(Method::DELETE, &["_api", "document", collection, key])
}

pub fn explain(query: &str) -> ApiCall {
    ApiCall::post(&["_api", "explain"], json!({ "query": query }))
}

/// Fetch the next batch of an open cursor.
pub fn next_batch(cursor_id: &str) -> ApiCall {
    ApiCall::new(Method::PUT, &["_api", "cursor", cursor_id])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_uses_bind_variables() {
        let traversal = Traversal {
            start_vertex: "users/alice",
            edge_collection: "follows",
            direction: Direction::parse(Some("inbound")).unwrap(),
            min_depth: 2,
            max_depth: 4,
        };
        let aql = traversal.to_query();

        assert!(aql.query.contains("2..4 INBOUND @start @@edges"));
        assert!(!aql.query.contains("users/alice"));
        assert!(!aql.query.contains("follows"));
        assert_eq!(aql.bind_vars["start"], "users/alice");
        assert_eq!(aql.bind_vars["@edges"], "follows");
    }

    #[test]
    fn test_direction_defaults_and_rejects() {
        assert_eq!(Direction::parse(None).unwrap(), Direction::Outbound);
        assert_eq!(Direction::parse(Some("Any")).unwrap(), Direction::Any);
        let err = Direction::parse(Some("sideways")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown traversal direction: sideways");
    }

    #[test]
    fn test_fulltext_index_ignores_unique() {
        let body = index_definition(IndexKind::Fulltext, &split_fields("title"), true);
        assert_eq!(body, json!({ "type": "fulltext", "fields": ["title"] }));
    }

    #[test]
    fn test_persistent_index_keeps_unique() {
        let call = create_index("users", IndexKind::Persistent, &split_fields("email, tenant"), true);
        assert_eq!(call.query_value("collection"), Some("users"));
        assert_eq!(
            call.body,
            Some(json!({ "type": "persistent", "fields": ["email", "tenant"], "unique": true }))
        );
    }

    #[test]
    fn test_unknown_index_kind() {
        let err = "btree".parse::<IndexKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown index type: btree");
    }

    #[test]
    fn test_collection_kind() {
        assert_eq!(CollectionKind::parse(None).unwrap(), CollectionKind::Document);
        assert_eq!(create_collection("knows", CollectionKind::Edge).body, Some(json!({ "name": "knows", "type": 3 })));
        assert!(CollectionKind::parse(Some("graph")).is_err());
        assert_eq!(CollectionKind::from_code(Some(2)), CollectionKind::Document);
        assert_eq!(CollectionKind::from_code(Some(3)), CollectionKind::Edge);
    }

    #[test]
    fn test_document_paths() {
        assert_eq!(get_document("users", "42").path(), "/_api/document/users/42");
        assert_eq!(update_document("users", "42", json!({})).method, Method::PATCH);
        assert_eq!(remove_document("users", "42").method, Method::DELETE);
    }
}
