//! Level-2 comment strategy
//!
//! Same endpoint and walk as level 1, but scoped to the replies under one
//! level-1 comment: `fetch_level=1`, `is_mix=1`, and `max_id` is always
//! present (`0` before the first cursor arrives).

use crate::engine::strategy::{FetchStrategy, ParsedPage, RawResponse, WorkUnit};
use crate::parse::process_comment_response;
use crate::records::{Comment2Record, TypedRecord};
use crate::strategies::{thread_ids, COMMENTS_PATH};
use crate::Result;
use chrono::Utc;
use reqwest::{Client, Request};
use serde_json::{Map, Value};

const DEFAULT_API_BASE: &str = "https://weibo.com";

/// Strategy for level-2 comment threads
pub struct Comment2Strategy {
    threads: Vec<(String, String)>,
    collection: String,
    base_url: String,
}

impl Comment2Strategy {
    /// `threads` is a list of `(uid, mid)` parent comment identities
    pub fn new(threads: Vec<(String, String)>, collection: &str) -> Self {
        Self {
            threads,
            collection: collection.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Points the strategy at a different host (tests)
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

impl FetchStrategy for Comment2Strategy {
    fn description(&self) -> String {
        format!("level-2 comments ({} threads)", self.threads.len())
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn enumerate_work(&self) -> Vec<WorkUnit> {
        self.threads
            .iter()
            .map(|(uid, mid)| WorkUnit::Thread {
                uid: uid.clone(),
                mid: mid.clone(),
            })
            .collect()
    }

    fn build_request(
        &self,
        client: &Client,
        unit: &WorkUnit,
        cursor: Option<&str>,
    ) -> Result<Request> {
        let (uid, mid) = thread_ids(unit)?;

        let request = client
            .get(format!("{}{}", self.base_url, COMMENTS_PATH))
            .query(&[
                ("flow", "0"),
                ("is_reload", "1"),
                ("id", mid),
                ("is_show_bulletin", "2"),
                ("is_mix", "1"),
                ("fetch_level", "1"),
                ("count", "20"),
                ("uid", uid),
                ("locale", "zh-CN"),
                ("max_id", cursor.unwrap_or("0")),
            ])
            .build()?;
        Ok(request)
    }

    fn parse_response(&self, response: &RawResponse, _unit: &WorkUnit) -> Result<ParsedPage> {
        let (info, items) = process_comment_response(&response.body)?;
        Ok(ParsedPage {
            items,
            page_info: Some(info),
        })
    }

    fn to_typed_records(
        &self,
        items: Vec<Map<String, Value>>,
        unit: &WorkUnit,
    ) -> Vec<TypedRecord> {
        let Ok((uid, mid)) = thread_ids(unit) else {
            return Vec::new();
        };
        items
            .into_iter()
            .map(|item| {
                TypedRecord::Comment2(Comment2Record {
                    mid: crate::parse::numeric_id(item.get("mid")),
                    uid: crate::parse::numeric_id(item.get("uid")),
                    f_mid: mid.trim().parse().ok(),
                    f_uid: uid.trim().parse().ok(),
                    search_for: self.collection.clone(),
                    create_time: Utc::now(),
                    json_data: Value::Object(item),
                })
            })
            .collect()
    }

    fn is_threaded(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> WorkUnit {
        WorkUnit::Thread {
            uid: "111".to_string(),
            mid: "222".to_string(),
        }
    }

    #[test]
    fn test_first_fetch_sends_zero_cursor() {
        let strategy = Comment2Strategy::new(vec![("111".into(), "222".into())], "c2");
        let request = strategy
            .build_request(&Client::new(), &thread(), None)
            .unwrap();
        let query = request.url().query().unwrap();
        assert!(query.contains("fetch_level=1"));
        assert!(query.contains("is_mix=1"));
        assert!(query.contains("max_id=0"));
    }

    #[test]
    fn test_cursor_replaces_zero() {
        let strategy = Comment2Strategy::new(vec![("111".into(), "222".into())], "c2");
        let request = strategy
            .build_request(&Client::new(), &thread(), Some("98765"))
            .unwrap();
        assert!(request.url().query().unwrap().contains("max_id=98765"));
    }
}
