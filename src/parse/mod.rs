//! Response normalization
//!
//! Parsers turn raw response bodies into plain item maps (plus per-fetch
//! cursor state for comment pages). They promote nothing beyond the handful
//! of identifier fields the records need; everything else rides along in
//! the opaque payload.

mod body;
mod comment;
mod list;

pub use body::process_body_response;
pub use comment::process_comment_response;
pub use list::parse_list_html;

use serde_json::Value;

/// Reads a numeric identifier that the source may ship as either a JSON
/// number or a decimal string
///
/// Absent or unparsable values stay `None`; an unknown id is never zero.
pub fn numeric_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
