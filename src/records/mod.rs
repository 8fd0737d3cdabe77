//! Typed records produced by the resource strategies
//!
//! Every persisted item is one of three record shapes: a body record (one
//! weibo, scraped from search HTML or fetched from the detail API), or a
//! level-1/level-2 comment record attached to a parent message. All three
//! carry the full normalized source document as an opaque JSON payload next
//! to the handful of promoted identifier fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier generated by the document store for one persisted record
pub type DocId = i64;

/// Where a body record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFrom {
    /// Scraped out of a search-result HTML page
    Html,
    /// Returned by the detail JSON API
    Api,
}

/// One weibo body
///
/// `mid`/`uid` stay `None` when the source response did not supply them;
/// an unknown id is never coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyRecord {
    pub mid: Option<i64>,
    pub uid: Option<i64>,
    pub search_for: String,
    pub create_time: DateTime<Utc>,
    pub record_from: RecordFrom,
    pub json_data: Value,
}

/// One level-1 comment, parented to a body via `f_mid`/`f_uid`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment1Record {
    pub mid: Option<i64>,
    pub uid: Option<i64>,
    pub f_mid: Option<i64>,
    pub f_uid: Option<i64>,
    pub search_for: String,
    pub create_time: DateTime<Utc>,
    pub json_data: Value,
}

/// One level-2 comment, parented to a level-1 comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment2Record {
    pub mid: Option<i64>,
    pub uid: Option<i64>,
    pub f_mid: Option<i64>,
    pub f_uid: Option<i64>,
    pub search_for: String,
    pub create_time: DateTime<Utc>,
    pub json_data: Value,
}

/// Tagged variant over the three record shapes
///
/// Serializes untagged: the persisted document is the flat field set of the
/// variant, with no identifier field (the store generates that on insert).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TypedRecord {
    Body(BodyRecord),
    Comment1(Comment1Record),
    Comment2(Comment2Record),
}

impl TypedRecord {
    /// Message id of the underlying record, when the source supplied one
    pub fn mid(&self) -> Option<i64> {
        match self {
            TypedRecord::Body(r) => r.mid,
            TypedRecord::Comment1(r) => r.mid,
            TypedRecord::Comment2(r) => r.mid,
        }
    }

    /// Author id of the underlying record, when the source supplied one
    pub fn uid(&self) -> Option<i64> {
        match self {
            TypedRecord::Body(r) => r.uid,
            TypedRecord::Comment1(r) => r.uid,
            TypedRecord::Comment2(r) => r.uid,
        }
    }

    /// Converts the record to its persistable JSON document form
    pub fn to_document(&self) -> Value {
        // Serialization of these shapes cannot fail; fall back to an empty
        // object rather than poisoning a whole batch.
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

impl BodyRecord {
    /// Builds a body record around one normalized item map
    pub fn from_item(item: Map<String, Value>, search_for: &str, record_from: RecordFrom) -> Self {
        let mid = crate::parse::numeric_id(item.get("mid"));
        let uid = crate::parse::numeric_id(item.get("uid"));
        BodyRecord {
            mid,
            uid,
            search_for: search_for.to_string(),
            create_time: Utc::now(),
            record_from,
            json_data: Value::Object(item),
        }
    }
}
