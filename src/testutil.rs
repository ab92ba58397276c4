//! Test utilities: mock implementations of the collector's seams.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks use
//! `Mutex` for interior mutability, allowing assertions on recorded calls.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Announcement, RawItem, Source};
use crate::services::transport::{HttpResponse, HttpTransport, Params};
use crate::services::SourceClient;
use crate::storage::AnnouncementSink;

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

/// One request seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Transport that replays queued responses and records every request.
///
/// In table mode, `post_json` behaves like a PostgREST table with a unique
/// `(source, source_id)` constraint instead of consuming the queue.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    table: Option<Mutex<BTreeMap<(String, String), Value>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<Result<HttpResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Mock whose JSON posts land in an in-memory unique-keyed table.
    pub fn upsert_table() -> Self {
        Self {
            table: Some(Mutex::new(BTreeMap::new())),
            ..Self::default()
        }
    }

    pub fn push(&self, response: Result<HttpResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_json(&self, value: Value) {
        self.push(Ok(HttpResponse::new(200, value.to_string())));
    }

    pub fn push_timeout(&self) {
        self.push(Err(AppError::transport("mock", "request timed out")));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Rows currently stored in table mode.
    pub fn rows(&self) -> Vec<Value> {
        self.table
            .as_ref()
            .map(|t| t.lock().unwrap().values().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&self, method: &'static str, url: &str, params: &Params, body: Option<&Value>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            params: params.to_vec(),
            body: body.cloned(),
        });
    }

    fn next(&self) -> Result<HttpResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::transport("mock", "no response queued")))
    }

    fn upsert(
        table: &Mutex<BTreeMap<(String, String), Value>>,
        headers: &Params,
        body: &Value,
    ) -> HttpResponse {
        let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or("").to_string();
        let key = (field("source"), field("source_id"));
        let merge = headers
            .iter()
            .any(|(name, value)| name == "Prefer" && value.contains("merge-duplicates"));

        let mut table = table.lock().unwrap();
        if table.contains_key(&key) && !merge {
            return HttpResponse::new(409, r#"{"code":"23505"}"#);
        }
        table.insert(key, body.clone());
        HttpResponse::new(201, "")
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str, query: &Params) -> Result<HttpResponse> {
        self.record("GET", url, query, None);
        self.next()
    }

    async fn post_form(&self, url: &str, form: &Params) -> Result<HttpResponse> {
        self.record("POST", url, form, None);
        self.next()
    }

    async fn post_json(&self, url: &str, headers: &Params, body: &Value) -> Result<HttpResponse> {
        self.record("POST", url, headers, Some(body));
        match &self.table {
            Some(table) => Ok(Self::upsert(table, headers, body)),
            None => self.next(),
        }
    }
}

// ---------------------------------------------------------------------------
// MockClient
// ---------------------------------------------------------------------------

/// Source client returning a fixed list of raw items.
pub struct MockClient {
    source: Source,
    items: Vec<RawItem>,
    calls: AtomicUsize,
}

impl MockClient {
    pub fn new(source: Source, items: Vec<RawItem>) -> Self {
        Self {
            source,
            items,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceClient for MockClient {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch(&self, _today: NaiveDate) -> Vec<RawItem> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.items.clone()
    }
}

/// Lets a test keep a handle on a client a `Collector` takes ownership of.
#[async_trait]
impl SourceClient for Arc<MockClient> {
    fn source(&self) -> Source {
        (**self).source()
    }

    async fn fetch(&self, today: NaiveDate) -> Vec<RawItem> {
        (**self).fetch(today).await
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Sink that records batches and can be told to reject one source.
#[derive(Default)]
pub struct MockSink {
    batches: Mutex<Vec<Vec<Announcement>>>,
    reject: Option<Source>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any batch containing a record from `source`.
    pub fn rejecting(source: Source) -> Self {
        Self {
            reject: Some(source),
            ..Self::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<Announcement>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnnouncementSink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn write(&self, records: &[Announcement]) -> Result<usize> {
        if let Some(source) = self.reject {
            if records.iter().any(|r| r.source == source) {
                return Err(AppError::persistence("mock", "store unavailable"));
            }
        }
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(records.len())
    }
}

/// Raw item from JSON object literal.
pub fn raw(value: Value) -> RawItem {
    RawItem::from(value.as_object().cloned().unwrap_or_default())
}

/// Fixed "today" used across tests.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}
