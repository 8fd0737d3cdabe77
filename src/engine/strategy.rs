//! Strategy contract for the fetch engine
//!
//! Each resource kind (search list pages, detail pages, level-1 and level-2
//! comment threads) implements [`FetchStrategy`]: it enumerates the work
//! list, builds one request per unit, and turns one response into zero or
//! more typed records. Comment strategies also surface per-fetch cursor
//! state so the engine can drive the pagination walk.

use crate::records::TypedRecord;
use crate::Result;
use reqwest::header::HeaderMap;
use reqwest::{Client, Request};
use serde_json::{Map, Value};

/// One discrete fetch target enumerated by a strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkUnit {
    /// A search-result page index
    Page(u32),
    /// A detail-page identifier (mblogid)
    Detail(String),
    /// A comment thread, identified by its parent message
    Thread { uid: String, mid: String },
}

impl WorkUnit {
    /// Short label for progress reporting and logs
    pub fn label(&self) -> String {
        match self {
            WorkUnit::Page(index) => format!("page {}", index),
            WorkUnit::Detail(id) => id.clone(),
            WorkUnit::Thread { mid, .. } => mid.clone(),
        }
    }
}

/// Raw result of one network call
///
/// Ephemeral: consumed synchronously by validation and parsing, never
/// persisted.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

/// Per-fetch cursor state reported by a comment page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPageInfo {
    /// Server-opaque token for the next page
    pub next_cursor: String,
    /// Expected total items in the thread, as the server reports it
    pub total_number: u64,
    /// Items returned by this fetch
    pub page_item_count: u64,
}

/// Outcome of parsing one response
#[derive(Debug)]
pub struct ParsedPage {
    /// Normalized plain records extracted from the response
    pub items: Vec<Map<String, Value>>,
    /// Cursor state; present only for comment-thread responses
    pub page_info: Option<CommentPageInfo>,
}

impl ParsedPage {
    pub fn flat(items: Vec<Map<String, Value>>) -> Self {
        Self {
            items,
            page_info: None,
        }
    }
}

/// Capability set each resource kind supplies to the engine
pub trait FetchStrategy: Send + Sync {
    /// Progress label for the whole run
    fn description(&self) -> String;

    /// Name of the collection this strategy persists into
    fn collection(&self) -> &str;

    /// Enumerates the work list; immutable once returned
    fn enumerate_work(&self) -> Vec<WorkUnit>;

    /// Builds one request for a unit
    ///
    /// `cursor` is `None` for flat resources and for the first fetch of a
    /// thread walk; later walk fetches pass the server-supplied token.
    fn build_request(&self, client: &Client, unit: &WorkUnit, cursor: Option<&str>)
        -> Result<Request>;

    /// Turns one validated response into plain records (plus cursor state
    /// for comment kinds)
    fn parse_response(&self, response: &RawResponse, unit: &WorkUnit) -> Result<ParsedPage>;

    /// Lifts plain records into typed records ready for the sink
    fn to_typed_records(&self, items: Vec<Map<String, Value>>, unit: &WorkUnit)
        -> Vec<TypedRecord>;

    /// True when unit processing is a cursor-paginated thread walk rather
    /// than a single fetch
    fn is_threaded(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_labels() {
        assert_eq!(WorkUnit::Page(3).label(), "page 3");
        assert_eq!(WorkUnit::Detail("OiZre8dir".to_string()).label(), "OiZre8dir");
        let thread = WorkUnit::Thread {
            uid: "1".to_string(),
            mid: "42".to_string(),
        };
        assert_eq!(thread.label(), "42");
    }
}
