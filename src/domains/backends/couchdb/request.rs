//! CouchDB request builders.
//!
//! Each builder yields an [`ApiCall`]: method, percent-encoded path segments,
//! query pairs and an optional JSON body.

use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};

use crate::domains::backends::http::ApiCall;
use crate::domains::tools::normalize::{FIND_CAP, QUERY_CAP};

pub const ALL_DOCS_LIMIT: i64 = QUERY_CAP as i64;
pub const CHANGES_LIMIT: i64 = QUERY_CAP as i64;
pub const FIND_LIMIT: i64 = FIND_CAP as i64;

pub fn server_root() -> ApiCall {
    ApiCall::get(&[])
}

pub fn all_dbs() -> ApiCall {
    ApiCall::get(&["_all_dbs"])
}

pub fn create_database(name: &str) -> ApiCall {
    ApiCall::new(Method::PUT, &[name])
}

pub fn delete_database(name: &str) -> ApiCall {
    ApiCall::new(Method::DELETE, &[name])
}

pub fn database_info(db: &str) -> ApiCall {
    ApiCall::get(&[db])
}

pub fn all_docs(db: &str, include_docs: bool, limit: i64, skip: Option<i64>) -> ApiCall {
    let mut call = ApiCall::get(&[db, "_all_docs"]);
    if include_docs {
        call = call.with_query("include_docs", "true");
    }
    call = call.with_query("limit", limit.to_string());
    if let Some(skip) = skip {
        call = call.with_query("skip", skip.to_string());
    }
    call
}

pub fn get_document(db: &str, id: &str, rev: Option<&str>) -> ApiCall {
    let call = ApiCall::get(&[db, id]);
    match rev {
        Some(rev) => call.with_query("rev", rev),
        None => call,
    }
}

/// `PUT /db/id` with an explicit id, `POST /db` otherwise.
pub fn insert_document(db: &str, id: Option<&str>, document: Value) -> ApiCall {
    match id {
        Some(id) => ApiCall::new(Method::PUT, &[db, id]).with_body(document),
        None => ApiCall::post(&[db], document),
    }
}

pub fn delete_document(db: &str, id: &str, rev: &str) -> ApiCall {
    ApiCall::new(Method::DELETE, &[db, id]).with_query("rev", rev)
}

/// Body of a `_find` request.
#[derive(Debug, Clone, Serialize)]
pub struct MangoQuery {
    pub selector: Value,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
}

impl MangoQuery {
    pub fn new(selector: Value) -> Self {
        Self {
            selector,
            limit: FIND_LIMIT,
            fields: None,
            skip: None,
            sort: None,
        }
    }
}

pub fn find(db: &str, query: &MangoQuery) -> ApiCall {
    ApiCall::post(&[db, "_find"], json!(query))
}

/// Body of an `_index` request.
#[derive(Debug, Clone, Serialize)]
pub struct MangoIndex {
    pub index: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ddoc: Option<String>,
}

pub fn create_index(db: &str, index: &MangoIndex) -> ApiCall {
    ApiCall::post(&[db, "_index"], json!(index))
}

/// Optional view parameters; keys are passed through as JSON text.
#[derive(Debug, Clone, Default)]
pub struct ViewQuery<'a> {
    pub key: Option<&'a str>,
    pub startkey: Option<&'a str>,
    pub endkey: Option<&'a str>,
    pub limit: Option<i64>,
    pub include_docs: bool,
    /// Send `reduce=false`.
    pub skip_reduce: bool,
    pub group: bool,
}

pub fn view(db: &str, design: &str, view: &str, query: &ViewQuery<'_>) -> ApiCall {
    let mut call = ApiCall::get(&[db, "_design", design, "_view", view]);
    for (name, value) in [
        ("key", query.key),
        ("startkey", query.startkey),
        ("endkey", query.endkey),
    ] {
        if let Some(value) = value {
            call = call.with_query(name, value);
        }
    }
    if let Some(limit) = query.limit {
        call = call.with_query("limit", limit.to_string());
    }
    if query.include_docs {
        call = call.with_query("include_docs", "true");
    }
    if query.skip_reduce {
        call = call.with_query("reduce", "false");
    }
    if query.group {
        call = call.with_query("group", "true");
    }
    call
}

pub fn bulk_docs(db: &str, docs: Value) -> ApiCall {
    ApiCall::post(&[db, "_bulk_docs"], json!({ "docs": docs }))
}

pub fn changes(db: &str, since: Option<&str>, limit: i64, include_docs: bool) -> ApiCall {
    let mut call = ApiCall::get(&[db, "_changes"]);
    if let Some(since) = since {
        call = call.with_query("since", since);
    }
    call = call.with_query("limit", limit.to_string());
    if include_docs {
        call = call.with_query("include_docs", "true");
    }
    call
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_put_with_id_post_without() {
        let with_id = insert_document("users", Some("alice"), json!({ "name": "Alice" }));
        assert_eq!(with_id.method, Method::PUT);
        assert_eq!(with_id.path(), "/users/alice");

        let without = insert_document("users", None, json!({ "name": "Bob" }));
        assert_eq!(without.method, Method::POST);
        assert_eq!(without.path(), "/users");
    }

    #[test]
    fn test_all_docs_default_limit() {
        let call = all_docs("users", false, ALL_DOCS_LIMIT, None);
        assert_eq!(call.query, vec![("limit".to_string(), "100".to_string())]);

        let call = all_docs("users", true, 5, Some(10));
        assert_eq!(call.query_value("include_docs"), Some("true"));
        assert_eq!(call.query_value("skip"), Some("10"));
    }

    #[test]
    fn test_find_body_omits_absent_fields() {
        let mut query = MangoQuery::new(json!({ "type": "user" }));
        assert_eq!(
            find("users", &query).body,
            Some(json!({ "selector": { "type": "user" }, "limit": 25 }))
        );

        query.skip = Some(5);
        query.sort = Some(json!([{ "name": "asc" }]));
        let body = find("users", &query).body.unwrap();
        assert_eq!(body["skip"], 5);
        assert!(body.get("fields").is_none());
    }

    #[test]
    fn test_view_query_flags() {
        let query = ViewQuery {
            key: Some("\"alice\""),
            skip_reduce: true,
            group: true,
            ..ViewQuery::default()
        };
        let call = view("users", "by_name", "all", &query);
        assert_eq!(call.path(), "/users/_design/by_name/_view/all");
        assert_eq!(call.query_value("key"), Some("\"alice\""));
        assert_eq!(call.query_value("reduce"), Some("false"));
        assert_eq!(call.query_value("group"), Some("true"));
        assert_eq!(call.query_value("limit"), None);
    }

    #[test]
    fn test_delete_document_carries_rev() {
        let call = delete_document("users", "alice", "1-abc");
        assert_eq!(call.method, Method::DELETE);
        assert_eq!(call.query_value("rev"), Some("1-abc"));
    }
}
