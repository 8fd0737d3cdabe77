//! Concrete resource strategies
//!
//! Four resource kinds plug into the engine: search-result list pages,
//! detail pages, and the two comment-thread levels. Each owns its request
//! surface and its record shape; the engine stays ignorant of both.

mod body;
mod comment1;
mod comment2;
mod list;

pub use body::DetailStrategy;
pub use comment1::Comment1Strategy;
pub use comment2::Comment2Strategy;
pub use list::{AdvancedKind, SearchKind, SearchListStrategy};

use crate::engine::WorkUnit;
use crate::{HarvestError, Result};

/// Comment endpoint shared by both thread levels
pub(crate) const COMMENTS_PATH: &str = "/ajax/statuses/buildComments";

pub(crate) fn thread_ids(unit: &WorkUnit) -> Result<(&str, &str)> {
    match unit {
        WorkUnit::Thread { uid, mid } => Ok((uid.as_str(), mid.as_str())),
        other => Err(HarvestError::Response(format!(
            "expected a thread work unit, got {:?}",
            other
        ))),
    }
}
