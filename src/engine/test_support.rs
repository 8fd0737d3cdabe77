//! Shared fakes for engine tests: deterministic transports and minimal
//! strategies backed by an in-memory document store.

use crate::config::EngineSettings;
use crate::engine::progress::LogProgress;
use crate::engine::strategy::{FetchStrategy, ParsedPage, RawResponse, WorkUnit};
use crate::engine::transport::Transport;
use crate::engine::FetchEngine;
use crate::records::{BodyRecord, Comment1Record, RecordFrom, TypedRecord};
use crate::storage::{RecordSink, SqliteDocStore};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Request};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted transport step
#[derive(Clone)]
pub enum Step {
    Ok { status: u16, body: String },
    Timeout,
    Error,
}

struct ScriptedInner {
    steps: Vec<Step>,
    next: Mutex<usize>,
    repeat_last: bool,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

/// Transport that replays a fixed script of responses
#[derive(Clone)]
pub struct ScriptedTransport {
    inner: Arc<ScriptedInner>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                steps,
                next: Mutex::new(0),
                repeat_last: false,
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Replays one step forever
    pub fn repeating(step: Step) -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                steps: vec![step],
                next: Mutex::new(0),
                repeat_last: true,
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn always_timeout() -> Self {
        Self::repeating(Self::timeout_step())
    }

    pub fn ok_step(status: u16, body: &str) -> Step {
        Step::Ok {
            status,
            body: body.to_string(),
        }
    }

    pub fn timeout_step() -> Step {
        Step::Timeout
    }

    pub fn error_step() -> Step {
        Step::Error
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.inner.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: Request) -> Result<RawResponse> {
        let url = request.url().to_string();
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.urls.lock().unwrap().push(url.clone());

        let step = {
            let mut next = self.inner.next.lock().unwrap();
            let index = if self.inner.repeat_last {
                (*next).min(self.inner.steps.len() - 1)
            } else {
                *next
            };
            *next += 1;
            self.inner
                .steps
                .get(index)
                .cloned()
                .unwrap_or(Step::Error)
        };

        match step {
            Step::Ok { status, body } => Ok(RawResponse {
                status,
                headers: Default::default(),
                body,
            }),
            Step::Timeout => Err(HarvestError::Timeout { url }),
            Step::Error => Err(HarvestError::Response("connection reset".to_string())),
        }
    }
}

/// Transport that tracks how many requests are in flight at once
#[derive(Clone)]
pub struct GaugeTransport {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    delay: Duration,
}

impl GaugeTransport {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
            delay: Duration::from_millis(delay_ms),
        }
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for GaugeTransport {
    async fn execute(&self, _request: Request) -> Result<RawResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(RawResponse {
            status: 200,
            headers: Default::default(),
            body: r#"{"data": [{"mid": "1", "user": {"idstr": "2"}}]}"#.to_string(),
        })
    }
}

/// Flat (non-threaded) strategy over synthetic detail units
pub struct TestFlatStrategy {
    units: usize,
}

impl TestFlatStrategy {
    pub fn with_units(units: usize) -> Self {
        Self { units }
    }
}

impl FetchStrategy for TestFlatStrategy {
    fn description(&self) -> String {
        "flat test fetch".to_string()
    }

    fn collection(&self) -> &str {
        "flat_test"
    }

    fn enumerate_work(&self) -> Vec<WorkUnit> {
        (0..self.units)
            .map(|i| WorkUnit::Detail(format!("item{}", i)))
            .collect()
    }

    fn build_request(
        &self,
        client: &Client,
        unit: &WorkUnit,
        _cursor: Option<&str>,
    ) -> Result<Request> {
        let request = client
            .get(format!("http://localhost/detail/{}", unit.label()))
            .build()?;
        Ok(request)
    }

    fn parse_response(&self, response: &RawResponse, _unit: &WorkUnit) -> Result<ParsedPage> {
        let data: Value = serde_json::from_str(&response.body)?;
        let items = data
            .get("data")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_object)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(ParsedPage::flat(items))
    }

    fn to_typed_records(
        &self,
        items: Vec<Map<String, Value>>,
        unit: &WorkUnit,
    ) -> Vec<TypedRecord> {
        items
            .into_iter()
            .map(|mut item| {
                // Tag each document with its unit so persisted sets can be
                // compared across runs.
                item.insert("unit".to_string(), json!(unit.label()));
                TypedRecord::Body(BodyRecord::from_item(item, "test", RecordFrom::Api))
            })
            .collect()
    }
}

/// Threaded strategy mirroring the level-1 comment walk
#[derive(Default)]
pub struct TestThreadStrategy;

impl FetchStrategy for TestThreadStrategy {
    fn description(&self) -> String {
        "thread test fetch".to_string()
    }

    fn collection(&self) -> &str {
        "thread_test"
    }

    fn enumerate_work(&self) -> Vec<WorkUnit> {
        vec![WorkUnit::Thread {
            uid: "100".to_string(),
            mid: "500".to_string(),
        }]
    }

    fn build_request(
        &self,
        client: &Client,
        unit: &WorkUnit,
        cursor: Option<&str>,
    ) -> Result<Request> {
        let WorkUnit::Thread { uid, mid } = unit else {
            return Err(HarvestError::Response("expected thread unit".to_string()));
        };
        let mut builder = client
            .get("http://localhost/comments")
            .query(&[("uid", uid.as_str()), ("mid", mid.as_str())]);
        if let Some(cursor) = cursor {
            builder = builder.query(&[("max_id", cursor)]);
        }
        Ok(builder.build()?)
    }

    fn parse_response(&self, response: &RawResponse, _unit: &WorkUnit) -> Result<ParsedPage> {
        let (info, items) = crate::parse::process_comment_response(&response.body)?;
        Ok(ParsedPage {
            items,
            page_info: Some(info),
        })
    }

    fn to_typed_records(
        &self,
        items: Vec<Map<String, Value>>,
        unit: &WorkUnit,
    ) -> Vec<TypedRecord> {
        let WorkUnit::Thread { uid, mid } = unit else {
            return Vec::new();
        };
        items
            .into_iter()
            .map(|item| {
                TypedRecord::Comment1(Comment1Record {
                    mid: crate::parse::numeric_id(item.get("mid")),
                    uid: crate::parse::numeric_id(item.get("uid")),
                    f_mid: mid.parse().ok(),
                    f_uid: uid.parse().ok(),
                    search_for: self.collection().to_string(),
                    create_time: Utc::now(),
                    json_data: Value::Object(item),
                })
            })
            .collect()
    }

    fn is_threaded(&self) -> bool {
        true
    }
}

/// JSON body for one comment page: `count` items out of `total`, pointing
/// the walk at `cursor` next.
pub fn comment_page_body(cursor: &str, total: u64, count: u64) -> String {
    let items: Vec<Value> = (0..count)
        .map(|i| json!({"mid": format!("{}", 1000 + i), "user": {"idstr": "9"}}))
        .collect();
    json!({
        "ok": 1,
        "max_id": cursor,
        "total_number": total,
        "data": items,
    })
    .to_string()
}

/// Builds an engine over `transport` with an in-memory store
pub fn engine_with_transport<T: Transport + 'static>(
    transport: T,
    max_failed_times: u32,
) -> (FetchEngine, RecordSink) {
    let store = SqliteDocStore::open_in_memory().unwrap();
    let sink = RecordSink::new(Arc::new(Mutex::new(store)));
    let settings = EngineSettings {
        concurrency_limit: 8,
        max_failed_times,
        retry_attempts: 3,
        timeout_secs: 30,
    };
    let engine = FetchEngine::new(
        Arc::new(transport),
        Client::new(),
        sink.clone(),
        Arc::new(LogProgress),
        &settings,
    );
    (engine, sink)
}
