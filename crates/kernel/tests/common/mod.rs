#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`MemoryStore`] stands in for the host database: it serves canned rows
//! per report, applies the query window the way the database would, records
//! every query it is asked to run, and tracks scope lifetimes so tests can
//! check that each scope is released. [`FakeResolver`] scripts the URL
//! resolution collaborator per node id.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;

use insight_kernel::report::{
    BuiltQuery, ContentHandle, ReportStore, ReportingService, StoreScope, UrlResolver,
    WarmupOptions, WarmupPinger,
};
use insight_kernel::{AppState, ReportResult, routes};

#[derive(Default)]
struct MemoryInner {
    rows: HashMap<&'static str, Vec<JsonValue>>,
    tables: HashSet<String>,
    queries: Vec<BuiltQuery>,
    failing: bool,
    opened: usize,
    completed: usize,
    released: usize,
}

/// In-memory report store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rows` for every query of `report`.
    pub fn with_rows(self, report: &'static str, rows: Vec<JsonValue>) -> Self {
        self.inner.lock().unwrap().rows.insert(report, rows);
        self
    }

    /// Mark an optional table as provisioned.
    pub fn with_table(self, table: &str) -> Self {
        self.inner.lock().unwrap().tables.insert(table.to_string());
        self
    }

    /// Fail every count and fetch as if the connection dropped.
    pub fn failing(self) -> Self {
        self.inner.lock().unwrap().failing = true;
        self
    }

    /// Queries run so far.
    pub fn queries(&self) -> Vec<BuiltQuery> {
        self.inner.lock().unwrap().queries.clone()
    }

    /// (opened, completed, released) scope counts.
    pub fn scopes(&self) -> (usize, usize, usize) {
        let inner = self.inner.lock().unwrap();
        (inner.opened, inner.completed, inner.released)
    }

    pub fn service(&self) -> ReportingService {
        ReportingService::new(Arc::new(self.clone()))
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn begin(&self) -> ReportResult<Box<dyn StoreScope>> {
        self.inner.lock().unwrap().opened += 1;
        Ok(Box::new(MemoryScope {
            inner: Arc::clone(&self.inner),
        }))
    }

    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> bool {
        !self.inner.lock().unwrap().failing
    }
}

struct MemoryScope {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryScope {
    fn record(&self, query: &BuiltQuery) -> ReportResult<Vec<JsonValue>> {
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push(query.clone());
        if inner.failing {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(inner.rows.get(query.report).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl StoreScope for MemoryScope {
    async fn count(&mut self, query: &BuiltQuery) -> ReportResult<u64> {
        Ok(self.record(query)?.len() as u64)
    }

    async fn fetch(&mut self, query: &BuiltQuery) -> ReportResult<Vec<JsonValue>> {
        let rows = self.record(query)?;
        Ok(match query.window {
            Some(window) => rows
                .into_iter()
                .skip(window.offset as usize)
                .take(window.limit as usize)
                .collect(),
            None => rows,
        })
    }

    async fn table_exists(&mut self, table: &str) -> ReportResult<bool> {
        let inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(inner.tables.contains(table))
    }

    async fn complete(self: Box<Self>) -> ReportResult<()> {
        self.inner.lock().unwrap().completed += 1;
        Ok(())
    }
}

impl Drop for MemoryScope {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.released += 1;
        }
    }
}

/// How a [`FakeResolver`] treats one node id.
#[derive(Debug, Clone)]
pub enum FakeNode {
    /// Resolves to this URL.
    Url(String),
    /// The host has no content for the id.
    Missing,
    /// Content exists but has no public URL.
    Unrouted,
    /// Node lookup errors.
    LookupFails,
    /// URL lookup errors.
    UrlFails,
    /// Node lookup never answers.
    Hangs,
}

/// Scripted URL resolver.
#[derive(Clone, Default)]
pub struct FakeResolver {
    nodes: HashMap<i32, FakeNode>,
    looked_up: Arc<Mutex<Vec<i32>>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, id: i32, node: FakeNode) -> Self {
        self.nodes.insert(id, node);
        self
    }

    pub fn url(self, id: i32, url: &str) -> Self {
        self.node(id, FakeNode::Url(url.to_string()))
    }

    /// Node ids looked up so far, in order.
    pub fn looked_up(&self) -> Vec<i32> {
        self.looked_up.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrlResolver for FakeResolver {
    async fn resolve_node(&self, id: i32) -> anyhow::Result<Option<ContentHandle>> {
        self.looked_up.lock().unwrap().push(id);
        match self.nodes.get(&id) {
            None | Some(FakeNode::Missing) => Ok(None),
            Some(FakeNode::LookupFails) => Err(anyhow!("host API returned 500")),
            Some(FakeNode::Hangs) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
            Some(FakeNode::Url(url)) => Ok(Some(ContentHandle {
                id,
                url: Some(url.clone()),
            })),
            Some(FakeNode::Unrouted | FakeNode::UrlFails) => Ok(Some(ContentHandle { id, url: None })),
        }
    }

    async fn absolute_url(&self, node: &ContentHandle) -> anyhow::Result<Option<String>> {
        match self.nodes.get(&node.id) {
            Some(FakeNode::UrlFails) => Err(anyhow!("url provider threw")),
            _ => Ok(node.url.clone()),
        }
    }
}

/// Warm-up options with a short per-call timeout.
pub fn quick_warmup() -> WarmupOptions {
    WarmupOptions {
        call_timeout: Duration::from_millis(200),
    }
}

/// Template warm-up candidate rows.
pub fn template_rows(ids: &[i32]) -> Vec<JsonValue> {
    ids.iter().map(|id| json!({ "node_id": id })).collect()
}

/// Build the real router over an in-memory store.
pub fn app(store: &MemoryStore, resolver: FakeResolver) -> Router {
    let state = AppState::from_parts(
        store.service(),
        Arc::new(resolver),
        WarmupPinger::new(Duration::from_secs(2)).unwrap(),
        quick_warmup(),
    );
    routes::app(state)
}

/// Send a request and decode the JSON body.
pub async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, JsonValue) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, JsonValue) {
    send(router, "GET", uri).await
}

pub async fn post(router: &Router, uri: &str) -> (StatusCode, JsonValue) {
    send(router, "POST", uri).await
}

/// Serve `router` on an ephemeral local port, returning its base URL.
pub async fn serve_local(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
