//! Progress reporting
//!
//! The engine emits coarse progress events: one when a run starts, one per
//! finished work unit, and one after every fetch of a thread walk. The
//! display layer is an external collaborator; the default sink here just
//! logs through tracing.

/// One progress update from the engine
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    RunStarted {
        description: String,
        total_units: usize,
    },
    UnitFinished {
        label: String,
        completed: usize,
        total_units: usize,
    },
    /// Emitted after every fetch of a thread walk, successful or not
    ThreadPage {
        label: String,
        accumulated: u64,
        total: Option<u64>,
        consecutive_empty: u32,
    },
}

/// Consumer of progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Default sink: structured log lines
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted {
                description,
                total_units,
            } => {
                tracing::info!(total_units, "{}", description);
            }
            ProgressEvent::UnitFinished {
                label,
                completed,
                total_units,
            } => {
                tracing::info!(unit = %label, completed, total_units, "unit finished");
            }
            ProgressEvent::ThreadPage {
                label,
                accumulated,
                total,
                consecutive_empty,
            } => {
                tracing::debug!(
                    thread = %label,
                    accumulated,
                    total,
                    consecutive_empty,
                    "thread page"
                );
            }
        }
    }
}
