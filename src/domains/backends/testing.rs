//! Recording fakes for adapter tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::cassandra::cql::Statement;
use super::cassandra::session::{CqlConnector, CqlRows, CqlSession};
use super::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
use crate::core::config::CassandraConfig;
use crate::domains::tools::{ToolError, ToolResult};

/// Build a tool argument map from string pairs.
pub fn arguments(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

/// HTTP transport that records requests and replays queued responses.
///
/// With an empty queue every request gets `200 {}`.
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<HttpResponse>>,
    unreachable: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            unreachable: false,
        }
    }

    /// A transport whose every request fails like a refused connection.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new()
        }
    }

    pub fn respond_json(&self, status: u16, body: Value) {
        self.respond_text(status, "application/json", &body.to_string());
    }

    pub fn respond_text(&self, status: u16, content_type: &str, body: &str) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            status_text: status_text(status).to_string(),
            content_type: content_type.to_string(),
            body: body.to_string(),
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "",
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(request);
        if self.unreachable {
            return Err(HttpError("error sending request: connection refused".to_string()));
        }
        let queued = self.responses.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            content_type: "application/json".to_string(),
            body: "{}".to_string(),
        }))
    }
}

/// What a [`FakeCqlSession`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlCall {
    Execute(Statement),
    Batch(Vec<Statement>),
}

/// CQL session that records calls and replays queued row sets.
#[derive(Default)]
pub struct FakeCqlSession {
    calls: Mutex<Vec<CqlCall>>,
    results: Mutex<VecDeque<ToolResult<CqlRows>>>,
}

impl FakeCqlSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, rows: CqlRows) {
        self.results.lock().unwrap().push_back(Ok(rows));
    }

    pub fn fail(&self, message: &str) {
        self.results
            .lock()
            .unwrap()
            .push_back(Err(ToolError::backend("Cassandra", message)));
    }

    pub fn calls(&self) -> Vec<CqlCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the executed statements.
    pub fn statements(&self) -> Vec<Statement> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CqlCall::Execute(statement) => Some(statement),
                _ => None,
            })
            .collect()
    }

    fn next(&self) -> ToolResult<CqlRows> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CqlRows::default()))
    }
}

#[async_trait]
impl CqlSession for FakeCqlSession {
    async fn execute(&self, statement: &Statement) -> ToolResult<CqlRows> {
        self.calls
            .lock()
            .unwrap()
            .push(CqlCall::Execute(statement.clone()));
        self.next()
    }

    async fn batch(&self, statements: &[Statement]) -> ToolResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(CqlCall::Batch(statements.to_vec()));
        self.next().map(|_| ())
    }
}

/// Connector handing out one shared [`FakeCqlSession`], or failing.
///
/// Sessions registered with [`FakeConnector::keyspace`] are returned when the
/// connect config names that keyspace.
pub struct FakeConnector {
    session: Option<Arc<FakeCqlSession>>,
    by_keyspace: Mutex<HashMap<String, Arc<FakeCqlSession>>>,
    keyspaces: Mutex<Vec<String>>,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(session: Arc<FakeCqlSession>) -> Self {
        Self {
            session: Some(session),
            by_keyspace: Mutex::new(HashMap::new()),
            keyspaces: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            session: None,
            by_keyspace: Mutex::new(HashMap::new()),
            keyspaces: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn keyspace(self, keyspace: &str, session: Arc<FakeCqlSession>) -> Self {
        self.by_keyspace
            .lock()
            .unwrap()
            .insert(keyspace.to_string(), session);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Keyspace of every connect, in order.
    pub fn connected_keyspaces(&self) -> Vec<String> {
        self.keyspaces.lock().unwrap().clone()
    }
}

#[async_trait]
impl CqlConnector for FakeConnector {
    async fn connect(&self, config: &CassandraConfig) -> ToolResult<Arc<dyn CqlSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.keyspaces.lock().unwrap().push(config.keyspace.clone());
        if let Some(session) = self.by_keyspace.lock().unwrap().get(&config.keyspace) {
            return Ok(session.clone());
        }
        match &self.session {
            Some(session) => Ok(session.clone()),
            None => Err(ToolError::backend(
                "Cassandra",
                "Could not connect to any contact point",
            )),
        }
    }
}
