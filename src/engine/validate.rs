//! Response validation gate
//!
//! Classifies a raw response as acceptable before any parsing happens.
//! Acceptance requires HTTP 200 and, when the body is a JSON object carrying
//! an explicit `ok` status field, a success value in it. Non-JSON bodies on a
//! 200 pass through; body-level problems are the strategy's concern.

use crate::engine::strategy::RawResponse;
use serde_json::Value;

/// Returns true when the response should be processed further
///
/// Pure check: rejection never raises, it only tells the caller to skip this
/// unit attempt.
pub fn accept(response: &RawResponse) -> bool {
    if response.status != 200 {
        tracing::warn!(status = response.status, "unexpected response status");
        return false;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&response.body) {
        if let Some(ok) = map.get("ok") {
            if ok.as_i64() != Some(1) {
                let msg = map.get("msg").and_then(Value::as_str).unwrap_or("");
                tracing::warn!(ok = %ok, msg, "server signaled failure");
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_rejects_non_200() {
        assert!(!accept(&response(403, "")));
        assert!(!accept(&response(500, r#"{"ok": 1}"#)));
    }

    #[test]
    fn test_accepts_json_without_status_field() {
        assert!(accept(&response(200, r#"{"data": []}"#)));
    }

    #[test]
    fn test_accepts_success_status_field() {
        assert!(accept(&response(200, r#"{"ok": 1, "data": []}"#)));
    }

    #[test]
    fn test_rejects_server_signaled_failure() {
        assert!(!accept(&response(200, r#"{"ok": 0, "msg": "rate limited"}"#)));
        assert!(!accept(&response(200, r#"{"ok": -100}"#)));
    }

    #[test]
    fn test_accepts_non_json_body() {
        assert!(accept(&response(200, "<html><body>list page</body></html>")));
    }
}
