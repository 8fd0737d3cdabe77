//! Comment page normalization
//!
//! Both comment levels answer from the same endpoint with the same shape:
//! a `data` array of comment objects, a `max_id` cursor for the next page,
//! and a server-reported `total_number` for the whole thread. A rejected or
//! throttled response still carries `data`, just empty.

use crate::engine::strategy::CommentPageInfo;
use crate::Result;
use serde_json::{Map, Value};

/// Extracts cursor state and comment items from one comment response body
///
/// Each item gets its author id lifted into a top-level `uid` field (the
/// source nests it under `user.idstr`); `mid` is already top-level.
pub fn process_comment_response(body: &str) -> Result<(CommentPageInfo, Vec<Map<String, Value>>)> {
    let data: Value = serde_json::from_str(body)?;

    let next_cursor = match data.get("max_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let total_number = data
        .get("total_number")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut items: Vec<Map<String, Value>> = data
        .get("data")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    for item in &mut items {
        let author = item
            .get("user")
            .and_then(|user| user.get("idstr"))
            .cloned();
        if let Some(author) = author {
            item.insert("uid".to_string(), author);
        }
    }

    let info = CommentPageInfo {
        next_cursor,
        total_number,
        page_item_count: items.len() as u64,
    };
    Ok((info, items))
}
