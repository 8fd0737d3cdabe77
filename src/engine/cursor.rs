//! Cursor-pagination state machine for comment-thread walks
//!
//! A thread walk repeatedly fetches pages of a comment collection for one
//! `(uid, mid)` parent, feeding the server-supplied cursor of each accepted
//! page into the next fetch, until the server-reported total is reached or
//! the failure budget is spent.
//!
//! Transitions:
//! - first fetch carries no cursor; its accepted response seeds
//!   `total_number` (later totals are not re-read)
//! - an accepted page persists its records, accumulates the item count, and
//!   replaces the cursor; an empty page bumps the failure budget, a
//!   non-empty one resets it
//! - a rejected or missing response bumps the budget only: the cursor does
//!   not advance, so the next iteration retries the same position. Repeated
//!   rejections are routine under rate limiting, hence the budget.
//! - `accumulated >= total` terminates as `Exhausted`;
//!   `consecutive_empty >= max_failed_times` terminates as `Aborted`,
//!   keeping every page persisted so far. An aborted thread holds no
//!   resumption token; a later run starts it over.

use crate::engine::progress::ProgressEvent;
use crate::engine::strategy::{FetchStrategy, WorkUnit};
use crate::engine::{validate, FetchEngine};
use crate::records::DocId;

/// Internal state of one walk, discarded at terminal state
#[derive(Debug, Clone, Default)]
pub struct WalkState {
    pub cursor: Option<String>,
    pub total_number: Option<u64>,
    pub accumulated_count: u64,
    pub consecutive_empty_count: u32,
}

/// Terminal state of a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// The server-reported total was reached
    Exhausted,
    /// The failure budget was spent first; persisted pages remain valid
    Aborted,
}

/// One in-flight thread walk
///
/// Owned exclusively by the task processing its unit; nothing here is
/// shared across units.
pub(crate) struct ThreadWalk<'a> {
    engine: &'a FetchEngine,
    strategy: &'a dyn FetchStrategy,
    unit: &'a WorkUnit,
    state: WalkState,
    ids: Vec<DocId>,
}

impl<'a> ThreadWalk<'a> {
    pub(crate) fn new(
        engine: &'a FetchEngine,
        strategy: &'a dyn FetchStrategy,
        unit: &'a WorkUnit,
    ) -> Self {
        Self {
            engine,
            strategy,
            unit,
            state: WalkState::default(),
            ids: Vec::new(),
        }
    }

    /// Drives the walk to a terminal state
    pub(crate) async fn run(mut self) -> (WalkOutcome, Vec<DocId>) {
        loop {
            self.step().await;

            self.engine.progress.emit(ProgressEvent::ThreadPage {
                label: self.unit.label(),
                accumulated: self.state.accumulated_count,
                total: self.state.total_number,
                consecutive_empty: self.state.consecutive_empty_count,
            });

            if let Some(total) = self.state.total_number {
                if self.state.accumulated_count >= total {
                    return (WalkOutcome::Exhausted, self.ids);
                }
            }

            if self.state.consecutive_empty_count >= self.engine.max_failed_times {
                tracing::warn!(
                    thread = %self.unit.label(),
                    accumulated = self.state.accumulated_count,
                    total = self.state.total_number,
                    "failure budget spent, abandoning thread"
                );
                return (WalkOutcome::Aborted, self.ids);
            }
        }
    }

    /// One fetch-process cycle
    ///
    /// Any failure along the way (request build, fetch, validation, parse,
    /// absent cursor state) counts against the budget without advancing the
    /// cursor.
    async fn step(&mut self) {
        let request = match self.strategy.build_request(
            &self.engine.client,
            self.unit,
            self.state.cursor.as_deref(),
        ) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(thread = %self.unit.label(), error = %e, "request build failed");
                self.state.consecutive_empty_count += 1;
                return;
            }
        };

        let response = match self
            .engine
            .retry
            .execute(&*self.engine.transport, request)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(thread = %self.unit.label(), error = %e, "thread fetch failed");
                self.state.consecutive_empty_count += 1;
                return;
            }
        };

        if !validate::accept(&response) {
            self.state.consecutive_empty_count += 1;
            return;
        }

        let parsed = match self.strategy.parse_response(&response, self.unit) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(thread = %self.unit.label(), error = %e, "thread page parse failed");
                self.state.consecutive_empty_count += 1;
                return;
            }
        };

        let Some(info) = parsed.page_info else {
            tracing::warn!(thread = %self.unit.label(), "comment response carried no cursor state");
            self.state.consecutive_empty_count += 1;
            return;
        };

        let records = self.strategy.to_typed_records(parsed.items, self.unit);
        self.ids
            .extend(self.engine.sink.append(self.strategy.collection(), &records));

        if self.state.total_number.is_none() {
            self.state.total_number = Some(info.total_number);
        }
        self.state.accumulated_count += info.page_item_count;
        self.state.cursor = Some(info.next_cursor);
        self.state.consecutive_empty_count = if info.page_item_count == 0 {
            self.state.consecutive_empty_count + 1
        } else {
            0
        };
    }
}
