//! Result normalization shared by every backend.
//!
//! Read results are materialized and then truncated to a fixed cap; the cap
//! is a payload bound, not a cursor. Counts always report the size before
//! truncation.

use serde_json::{Map, Value, json};

/// Cap for query-like reads.
pub const QUERY_CAP: usize = 100;

/// Cap for search-like reads.
pub const SEARCH_CAP: usize = 50;

/// Default page size for Mango `_find`.
pub const FIND_CAP: usize = 25;

/// Cap for index-style reads (top-N distributions).
pub const INDEX_CAP: usize = 20;

/// Keep at most `cap` items.
pub fn truncate(mut items: Vec<Value>, cap: usize) -> Vec<Value> {
    items.truncate(cap);
    items
}

/// Build `{count, <key>: items[..cap]}` where `count` is the pre-cap size.
pub fn counted(key: &str, items: Vec<Value>, cap: usize) -> Value {
    let count = items.len();
    let mut envelope = Map::new();
    envelope.insert("count".to_string(), json!(count));
    envelope.insert(key.to_string(), Value::Array(truncate(items, cap)));
    Value::Object(envelope)
}

/// Flatten SPARQL JSON bindings into `{var: value}` rows.
///
/// Returns `None` when the document has no `results.bindings` array.
pub fn flatten_bindings(document: &Value) -> Option<Vec<Value>> {
    let bindings = document.get("results")?.get("bindings")?.as_array()?;
    Some(
        bindings
            .iter()
            .map(|row| {
                let flat: Map<String, Value> = row
                    .as_object()
                    .map(|vars| {
                        vars.iter()
                            .map(|(name, term)| {
                                (name.clone(), term.get("value").cloned().unwrap_or(Value::Null))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Value::Object(flat)
            })
            .collect(),
    )
}

/// Raw binding rows of a SPARQL JSON result (empty when absent).
pub fn binding_rows(document: &Value) -> &[Value] {
    document
        .get("results")
        .and_then(|r| r.get("bindings"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The `value` of variable `var` in one binding row.
pub fn binding_value<'a>(row: &'a Value, var: &str) -> Option<&'a str> {
    row.get(var)?.get("value")?.as_str()
}

/// Parse a count-like literal the lenient way, `null` when not numeric.
pub fn count_value(raw: Option<&str>) -> Value {
    raw.and_then(crate::domains::tools::params::parse_leading_int)
        .map_or(Value::Null, |n| json!(n))
}

/// Split a per-item result array into `(succeeded, failed)` counts.
///
/// An item succeeded when it carries a truthy `ok`, failed when it carries
/// an `error` field.
pub fn partition_outcomes(items: &[Value]) -> (usize, usize) {
    items.iter().fold((0, 0), |(ok, failed), item| {
        let succeeded = item.get("ok").is_some_and(is_truthy);
        let errored = item.get("error").is_some_and(|e| !e.is_null());
        (ok + succeeded as usize, failed + errored as usize)
    })
}

/// Drop the `error`/`code` status fields of an API envelope.
pub fn strip_status(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            map.remove("error");
            map.remove("code");
            Value::Object(map)
        }
        other => other,
    }
}

/// JavaScript-style truthiness for JSON values.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counted_reports_precap_size() {
        let rows: Vec<Value> = (0..250).map(|i| json!(i)).collect();
        let envelope = counted("results", rows, QUERY_CAP);
        assert_eq!(envelope["count"], 250);
        assert_eq!(envelope["results"].as_array().unwrap().len(), 100);
        assert_eq!(envelope["results"][99], 99);
    }

    #[test]
    fn test_counted_under_cap() {
        let envelope = counted("docs", vec![json!(1), json!(2)], FIND_CAP);
        assert_eq!(envelope, json!({ "count": 2, "docs": [1, 2] }));
    }

    #[test]
    fn test_flatten_bindings() {
        let doc = json!({
            "head": { "vars": ["s", "o"] },
            "results": { "bindings": [
                { "s": { "type": "uri", "value": "http://a" },
                  "o": { "type": "literal", "value": "x" } },
                { "s": { "type": "uri", "value": "http://b" } }
            ]}
        });
        let rows = flatten_bindings(&doc).unwrap();
        assert_eq!(rows[0], json!({ "s": "http://a", "o": "x" }));
        assert_eq!(rows[1], json!({ "s": "http://b" }));
    }

    #[test]
    fn test_flatten_bindings_absent() {
        assert!(flatten_bindings(&json!({ "boolean": true })).is_none());
        assert!(binding_rows(&json!("text")).is_empty());
    }

    #[test]
    fn test_partition_outcomes() {
        let items = vec![
            json!({ "ok": true, "id": "a", "rev": "1-x" }),
            json!({ "id": "b", "error": "conflict", "reason": "Document update conflict." }),
            json!({ "ok": true, "id": "c", "rev": "1-y" }),
        ];
        assert_eq!(partition_outcomes(&items), (2, 1));
    }

    #[test]
    fn test_count_value() {
        assert_eq!(count_value(Some("42")), json!(42));
        assert_eq!(count_value(Some("n/a")), Value::Null);
        assert_eq!(count_value(None), Value::Null);
    }

    #[test]
    fn test_strip_status() {
        let value = strip_status(json!({ "error": false, "code": 200, "count": 3 }));
        assert_eq!(value, json!({ "count": 3 }));
    }
}
