//! Detail page normalization
//!
//! The detail API answers with a single status object; it is wrapped in a
//! one-element list to line up with the other parsers.

use crate::Result;
use serde_json::{Map, Value};

/// Normalizes one detail response body into an item map
pub fn process_body_response(body: &str) -> Result<Vec<Map<String, Value>>> {
    let data: Value = serde_json::from_str(body)?;
    let Value::Object(mut item) = data else {
        return Err(crate::HarvestError::Response(
            "detail response is not a JSON object".to_string(),
        ));
    };

    let author = item
        .get("user")
        .and_then(|user| user.get("idstr"))
        .cloned();
    if let Some(author) = author {
        item.insert("uid".to_string(), author);
    }

    Ok(vec![item])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifts_author_id() {
        let body = r#"{"mid": "500123", "text_raw": "hello", "user": {"idstr": "42", "screen_name": "someone"}}"#;
        let items = process_body_response(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["uid"], "42");
        assert_eq!(items[0]["mid"], "500123");
    }

    #[test]
    fn test_missing_user_leaves_uid_absent() {
        let items = process_body_response(r#"{"mid": "1"}"#).unwrap();
        assert!(items[0].get("uid").is_none());
    }

    #[test]
    fn test_non_object_body_is_an_error() {
        assert!(process_body_response("[1, 2]").is_err());
        assert!(process_body_response("not json").is_err());
    }
}
