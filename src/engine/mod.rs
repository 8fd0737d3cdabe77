//! The fetch-and-persist engine
//!
//! [`FetchEngine`] enumerates a strategy's work list and executes each unit
//! either sequentially or with bounded fan-out, delegating response handling
//! to the strategy and persistence to the record sink. Comment strategies
//! route unit processing through the cursor walk in [`cursor`].

pub mod cursor;
pub mod progress;
pub mod retry;
pub mod strategy;
pub mod transport;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support;

pub use cursor::{WalkOutcome, WalkState};
pub use progress::{LogProgress, ProgressEvent, ProgressSink};
pub use retry::RetryPolicy;
pub use strategy::{CommentPageInfo, FetchStrategy, ParsedPage, RawResponse, WorkUnit};
pub use transport::{build_http_client, HttpTransport, Transport};

use crate::config::EngineSettings;
use crate::records::DocId;
use crate::storage::RecordSink;
use cursor::ThreadWalk;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Execution model for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One fetch-process cycle at a time, in work-list order
    Sequential,
    /// One task per unit behind an admission semaphore; the run returns
    /// only once every task has finished
    Concurrent,
}

/// The abstract downloader
///
/// Owns the shared client/session, the transport, the retry policy, and the
/// sink handle for one run. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct FetchEngine {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) client: Client,
    pub(crate) sink: RecordSink,
    pub(crate) progress: Arc<dyn ProgressSink>,
    pub(crate) retry: RetryPolicy,
    pub(crate) concurrency_limit: usize,
    pub(crate) max_failed_times: u32,
}

impl FetchEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        client: Client,
        sink: RecordSink,
        progress: Arc<dyn ProgressSink>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            transport,
            client,
            sink,
            progress,
            retry: RetryPolicy::new(settings.retry_attempts),
            concurrency_limit: settings.concurrency_limit.max(1),
            max_failed_times: settings.max_failed_times.max(1),
        }
    }

    /// Runs the whole work list and returns the persisted identifiers
    ///
    /// A run always returns, even when every unit failed; the list is then
    /// empty. Under [`RunMode::Concurrent`] accumulation order across units
    /// is nondeterministic, so callers needing order must treat the result as
    /// a set.
    pub async fn run(&self, strategy: Arc<dyn FetchStrategy>, mode: RunMode) -> Vec<DocId> {
        let units = strategy.enumerate_work();
        self.progress.emit(ProgressEvent::RunStarted {
            description: strategy.description(),
            total_units: units.len(),
        });

        match mode {
            RunMode::Sequential => self.run_sequential(strategy, units).await,
            RunMode::Concurrent => self.run_concurrent(strategy, units).await,
        }
    }

    async fn run_sequential(
        &self,
        strategy: Arc<dyn FetchStrategy>,
        units: Vec<WorkUnit>,
    ) -> Vec<DocId> {
        let total_units = units.len();
        let mut ids = Vec::new();
        for (index, unit) in units.into_iter().enumerate() {
            ids.extend(self.process_unit(&*strategy, &unit).await);
            self.progress.emit(ProgressEvent::UnitFinished {
                label: unit.label(),
                completed: index + 1,
                total_units,
            });
        }
        ids
    }

    async fn run_concurrent(
        &self,
        strategy: Arc<dyn FetchStrategy>,
        units: Vec<WorkUnit>,
    ) -> Vec<DocId> {
        let total_units = units.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let ids = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut tasks = JoinSet::new();
        for unit in units {
            let engine = self.clone();
            let strategy = Arc::clone(&strategy);
            let semaphore = Arc::clone(&semaphore);
            let ids = Arc::clone(&ids);
            let completed = Arc::clone(&completed);

            tasks.spawn(async move {
                // Admission gate: the permit is taken inside the task so at
                // most `concurrency_limit` fetches are in flight at once.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                let unit_ids = engine.process_unit(&*strategy, &unit).await;

                // Persistence for this unit happened before its ids become
                // visible to the caller.
                ids.lock().unwrap().extend(unit_ids);

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                engine.progress.emit(ProgressEvent::UnitFinished {
                    label: unit.label(),
                    completed: done,
                    total_units,
                });
            });
        }

        // Fan-in barrier: a panicked unit is logged, its siblings keep going.
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "work unit task failed");
            }
        }

        let mut ids = ids.lock().unwrap();
        std::mem::take(&mut *ids)
    }

    /// Processes one work unit to completion
    ///
    /// Every failure class short of a process error degrades to "this unit
    /// contributed nothing": retry exhaustion, validation rejection, parse
    /// errors, and sink failures are logged and skipped.
    async fn process_unit(&self, strategy: &dyn FetchStrategy, unit: &WorkUnit) -> Vec<DocId> {
        if strategy.is_threaded() {
            let (outcome, ids) = ThreadWalk::new(self, strategy, unit).run().await;
            if outcome == WalkOutcome::Aborted {
                tracing::warn!(unit = %unit.label(), persisted = ids.len(), "thread walk incomplete");
            }
            return ids;
        }

        let request = match strategy.build_request(&self.client, unit, None) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(unit = %unit.label(), error = %e, "request build failed");
                return Vec::new();
            }
        };

        let response = match self.retry.execute(&*self.transport, request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(unit = %unit.label(), error = %e, "unit produced no response");
                return Vec::new();
            }
        };

        if !validate::accept(&response) {
            return Vec::new();
        }

        let parsed = match strategy.parse_response(&response, unit) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(unit = %unit.label(), error = %e, "response parse failed");
                return Vec::new();
            }
        };

        let records = strategy.to_typed_records(parsed.items, unit);
        self.sink.append(strategy.collection(), &records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{
        engine_with_transport, GaugeTransport, ScriptedTransport, TestFlatStrategy,
    };
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_sequential_and_concurrent_persist_same_set() {
        let body = r#"{"data": [{"mid": "7", "user": {"idstr": "8"}}]}"#;
        let make_engine = || {
            let transport =
                ScriptedTransport::repeating(ScriptedTransport::ok_step(200, body));
            engine_with_transport(transport, 20)
        };
        let strategy: Arc<dyn FetchStrategy> = Arc::new(TestFlatStrategy::with_units(6));

        let (engine, sink) = make_engine();
        let sequential = engine.run(Arc::clone(&strategy), RunMode::Sequential).await;
        let seq_docs = sink.find_by_ids("flat_test", &sequential).unwrap();

        let (engine, sink) = make_engine();
        let concurrent = engine.run(Arc::clone(&strategy), RunMode::Concurrent).await;
        let conc_docs = sink.find_by_ids("flat_test", &concurrent).unwrap();

        assert_eq!(sequential.len(), concurrent.len());
        // Compare the normalized payloads; create_time is stamped per run
        // and cannot match across them.
        let seq_set: HashSet<String> =
            seq_docs.iter().map(|d| d["json_data"].to_string()).collect();
        let conc_set: HashSet<String> =
            conc_docs.iter().map(|d| d["json_data"].to_string()).collect();
        assert_eq!(seq_set, conc_set);
        assert_eq!(seq_set.len(), seq_docs.len());
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let transport = GaugeTransport::new(5);
        let (mut engine, _sink) = engine_with_transport(transport.clone(), 20);
        engine.concurrency_limit = 4;

        let strategy: Arc<dyn FetchStrategy> = Arc::new(TestFlatStrategy::with_units(32));
        engine.run(strategy, RunMode::Concurrent).await;

        assert_eq!(transport.total_calls(), 32);
        assert!(transport.peak_in_flight() <= 4);
    }

    #[tokio::test]
    async fn test_failed_units_do_not_abort_run() {
        // Unit fetches alternate between hard failure and success; the run
        // still returns the successful units' ids.
        let body = r#"{"data": [{"mid": "7", "user": {"idstr": "8"}}]}"#;
        let transport = ScriptedTransport::new(vec![
            ScriptedTransport::error_step(),
            ScriptedTransport::ok_step(200, body),
            ScriptedTransport::timeout_step(),
            ScriptedTransport::timeout_step(),
            ScriptedTransport::timeout_step(),
            ScriptedTransport::ok_step(200, body),
        ]);
        let (engine, _sink) = engine_with_transport(transport, 20);
        let strategy: Arc<dyn FetchStrategy> = Arc::new(TestFlatStrategy::with_units(4));

        let ids = engine.run(strategy, RunMode::Sequential).await;
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_response_contributes_nothing() {
        let transport =
            ScriptedTransport::repeating(ScriptedTransport::ok_step(200, r#"{"ok": 0}"#));
        let (engine, _sink) = engine_with_transport(transport, 20);
        let strategy: Arc<dyn FetchStrategy> = Arc::new(TestFlatStrategy::with_units(3));

        let ids = engine.run(strategy, RunMode::Sequential).await;
        assert!(ids.is_empty());
    }
}
