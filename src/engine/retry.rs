//! Bounded retry-on-timeout policy
//!
//! Wraps a single fetch with up to three attempts. Only the timeout failure
//! class is replayed; anything else propagates after the first attempt.
//! Exhaustion is logged and surfaced as an error the engine treats as "this
//! unit produced no response", never fatal to the run. The policy holds no
//! mutable state, so concurrent units share one value safely.

use crate::engine::strategy::RawResponse;
use crate::engine::transport::Transport;
use crate::{HarvestError, Result};
use reqwest::Request;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Executes `request` through `transport`, replaying timeouts
    ///
    /// Attempts are immediate: there is no sleep between retries beyond the
    /// transport's own timeout window.
    pub async fn execute(&self, transport: &dyn Transport, request: Request) -> Result<RawResponse> {
        let url = request.url().to_string();

        for attempt in 1..=self.max_attempts {
            // Each attempt consumes a fresh copy; GET requests always clone.
            let attempt_request =
                request
                    .try_clone()
                    .ok_or_else(|| HarvestError::RequestNotReplayable {
                        url: url.clone(),
                    })?;

            match transport.execute(attempt_request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() => {
                    if attempt < self.max_attempts {
                        tracing::warn!(url = %url, attempt, "request timed out, retrying");
                    } else {
                        tracing::error!(
                            url = %url,
                            attempts = self.max_attempts,
                            "request timed out, retry budget exhausted"
                        );
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(HarvestError::RetriesExhausted { url })
    }
}
