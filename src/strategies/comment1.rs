//! Level-1 comment strategy
//!
//! One work unit per `(uid, mid)` parent message; unit processing is a
//! cursor walk over the thread. The first fetch of a thread sends no
//! cursor; later fetches add `flow=0&max_id=<cursor>`.

use crate::engine::strategy::{FetchStrategy, ParsedPage, RawResponse, WorkUnit};
use crate::parse::process_comment_response;
use crate::records::{Comment1Record, TypedRecord};
use crate::strategies::{thread_ids, COMMENTS_PATH};
use crate::Result;
use chrono::Utc;
use reqwest::{Client, Request};
use serde_json::{Map, Value};

const DEFAULT_API_BASE: &str = "https://weibo.com";

/// Strategy for level-1 comment threads
pub struct Comment1Strategy {
    threads: Vec<(String, String)>,
    collection: String,
    base_url: String,
}

impl Comment1Strategy {
    /// `threads` is a list of `(uid, mid)` parent identities
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

impl FetchStrategy for Comment1Strategy {
    fn description(&self) -> String {
        format!("level-1 comments ({} threads)", self.threads.len())
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

        let mut builder = client
            .get(format!("{}{}", self.base_url, COMMENTS_PATH))
            .query(&[
                ("is_reload", "1"),
                ("id", mid),
                ("is_show_bulletin", "2"),
                ("is_mix", "0"),
                ("count", "20"),
                ("uid", uid),
                ("fetch_level", "0"),
                ("locale", "zh-CN"),
            ]);
        if let Some(cursor) = cursor {
            builder = builder.query(&[("flow", "0"), ("max_id", cursor)]);
        }
        Ok(builder.build()?)
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
                TypedRecord::Comment1(Comment1Record {
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
