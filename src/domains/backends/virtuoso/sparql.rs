//! SPARQL query and update builders.
//!
//! Everything here is plain text templating. URIs are wrapped in `<...>`
//! as given and free-text patterns only get single quotes doubled, so the
//! caller is trusted not to inject syntax.

use std::str::FromStr;

use crate::domains::tools::normalize::{INDEX_CAP, QUERY_CAP, SEARCH_CAP};
use crate::domains::tools::{ToolError, ToolResult};

pub const SELECT_LIMIT: i64 = QUERY_CAP as i64;
pub const SEARCH_LIMIT: i64 = SEARCH_CAP as i64;
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

pub const PROBE: &str = "ASK { ?s ?p ?o } LIMIT 1";

/// Whether the text already mentions `limit` anywhere.
pub fn has_limit(query: &str) -> bool {
    query.to_lowercase().contains("limit")
}

/// Append `LIMIT n` unless [`has_limit`].
pub fn limit_select(query: &str, limit: i64) -> String {
    if has_limit(query) {
        query.to_string()
    } else {
        format!("{} LIMIT {}", query, limit)
    }
}

/// RDF serialisations offered for CONSTRUCT and DESCRIBE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RdfFormat {
    #[default]
    Turtle,
    NTriples,
    RdfXml,
    JsonLd,
}

impl RdfFormat {
    pub fn parse(raw: Option<&str>) -> ToolResult<Self> {
        raw.map_or(Ok(Self::default()), str::parse)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Turtle => "turtle",
            Self::NTriples => "ntriples",
            Self::RdfXml => "rdfxml",
            Self::JsonLd => "jsonld",
        }
    }

    /// `Accept` header value.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::NTriples => "application/n-triples",
            Self::RdfXml => "application/rdf+xml",
            Self::JsonLd => "application/ld+json",
        }
    }
}

impl FromStr for RdfFormat {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turtle" => Ok(Self::Turtle),
            "ntriples" => Ok(Self::NTriples),
            "rdfxml" => Ok(Self::RdfXml),
            "jsonld" => Ok(Self::JsonLd),
            _ => Err(ToolError::translation(format!("Unknown RDF format: {}", s))),
        }
    }
}

/// Double single quotes for embedding in a `'...'` literal.
pub fn escape_literal(raw: &str) -> String {
    raw.replace('\'', "''")
}

fn from_clause(graph: Option<&str>) -> String {
    graph.map(|g| format!("FROM <{}>", g)).unwrap_or_default()
}

pub fn describe(uri: &str) -> String {
    format!("DESCRIBE <{}>", uri)
}

fn data_block(verb: &str, triples: &str, graph: Option<&str>) -> String {
    match graph {
        Some(graph) => format!("{} DATA {{ GRAPH <{}> {{ {} }} }}", verb, graph, triples),
        None => format!("{} DATA {{ {} }}", verb, triples),
    }
}

pub fn insert_data(triples: &str, graph: Option<&str>) -> String {
    data_block("INSERT", triples, graph)
}

pub fn delete_data(triples: &str, graph: Option<&str>) -> String {
    data_block("DELETE", triples, graph)
}

pub fn load(url: &str, graph: &str) -> String {
    format!("LOAD <{}> INTO GRAPH <{}>", url, graph)
}

pub fn clear_graph(graph: &str) -> String {
    format!("CLEAR GRAPH <{}>", graph)
}

pub fn list_graphs() -> String {
    format!(
        "SELECT DISTINCT ?g (COUNT(*) AS ?triples) WHERE {{ GRAPH ?g {{ ?s ?p ?o }} }} \
         GROUP BY ?g ORDER BY DESC(?triples) LIMIT {}",
        QUERY_CAP
    )
}

pub fn triple_count(graph: Option<&str>) -> String {
    format!(
        "SELECT (COUNT(*) AS ?count) {} WHERE {{ ?s ?p ?o }}",
        from_clause(graph)
    )
}

pub fn top_predicates(graph: Option<&str>) -> String {
    format!(
        "SELECT ?p (COUNT(*) AS ?count) {} WHERE {{ ?s ?p ?o }} \
         GROUP BY ?p ORDER BY DESC(?count) LIMIT {}",
        from_clause(graph),
        INDEX_CAP
    )
}

pub fn top_classes(graph: Option<&str>) -> String {
    format!(
        "SELECT ?class (COUNT(?s) AS ?count) {} WHERE {{ ?s a ?class }} \
         GROUP BY ?class ORDER BY DESC(?count) LIMIT {}",
        from_clause(graph),
        INDEX_CAP
    )
}

pub fn find_by_type(rdf_type: &str, graph: Option<&str>, limit: i64) -> String {
    format!(
        "SELECT ?resource ?label {} WHERE {{ ?resource a <{}> . \
         OPTIONAL {{ ?resource rdfs:label ?label }} }} LIMIT {}",
        from_clause(graph),
        rdf_type,
        limit
    )
}

/// Virtuoso full-text match through `bif:contains`.
pub fn text_search(pattern: &str, graph: Option<&str>, limit: i64) -> String {
    format!(
        "SELECT ?s ?p ?o {} WHERE {{ ?s ?p ?o . ?o bif:contains '{}' }} LIMIT {}",
        from_clause(graph),
        escape_literal(pattern),
        limit
    )
}

pub fn namespaces() -> String {
    format!(
        "SELECT DISTINCT (REPLACE(STR(?p), \"(#|/)[^#/]*$\", \"$1\") AS ?namespace) \
         WHERE {{ ?s ?p ?o }} LIMIT {}",
        QUERY_CAP
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_select() {
        assert_eq!(
            limit_select("SELECT * WHERE { ?s ?p ?o }", 100),
            "SELECT * WHERE { ?s ?p ?o } LIMIT 100"
        );
        let limited = "select * where { ?s ?p ?o } Limit 5";
        assert_eq!(limit_select(limited, 100), limited);
    }

    #[test]
    fn test_limit_token_inside_literal_suppresses_append() {
        let query = "SELECT ?s WHERE { ?s rdfs:label \"speed limit\" }";
        assert_eq!(limit_select(query, 100), query);
    }

    #[test]
    fn test_rdf_format() {
        assert_eq!(RdfFormat::parse(None).unwrap().media_type(), "text/turtle");
        assert_eq!(
            RdfFormat::parse(Some("jsonld")).unwrap().media_type(),
            "application/ld+json"
        );
        let err = RdfFormat::parse(Some("n3")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown RDF format: n3");
    }

    #[test]
    fn test_text_search_doubles_quotes() {
        let query = text_search("O'Brien", Some("http://example.org/g"), 50);
        assert!(query.contains("bif:contains 'O''Brien'"));
        assert!(query.contains("FROM <http://example.org/g>"));
        assert!(query.ends_with("LIMIT 50"));
    }

    #[test]
    fn test_data_blocks() {
        assert_eq!(
            insert_data("<a> <b> <c> .", Some("http://g")),
            "INSERT DATA { GRAPH <http://g> { <a> <b> <c> . } }"
        );
        assert_eq!(delete_data("<a> <b> <c> .", None), "DELETE DATA { <a> <b> <c> . }");
    }

    #[test]
    fn test_graph_stats_queries_share_from_clause() {
        for query in [
            triple_count(Some("http://g")),
            top_predicates(Some("http://g")),
            top_classes(Some("http://g")),
        ] {
            assert!(query.contains("FROM <http://g>"));
        }
        assert!(!triple_count(None).contains("FROM"));
        assert!(top_predicates(None).ends_with("LIMIT 20"));
    }
}
