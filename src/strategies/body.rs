//! Detail page strategy
//!
//! Fetches full statuses by mblogid through the detail API. One unit per
//! id, no pagination.

use crate::engine::strategy::{FetchStrategy, ParsedPage, RawResponse, WorkUnit};
use crate::parse::process_body_response;
use crate::records::{BodyRecord, RecordFrom, TypedRecord};
use crate::{HarvestError, Result};
use reqwest::{Client, Request};
use serde_json::{Map, Value};

const DEFAULT_API_BASE: &str = "https://weibo.com";
const SHOW_PATH: &str = "/ajax/statuses/show";

/// Strategy for detail pages of a set of mblogids
pub struct DetailStrategy {
    ids: Vec<String>,
    collection: String,
    base_url: String,
}

impl DetailStrategy {
    pub fn new(ids: Vec<String>, collection: &str) -> Self {
        Self {
            ids,
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

impl FetchStrategy for DetailStrategy {
    fn description(&self) -> String {
        format!("detail pages ({} ids)", self.ids.len())
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn enumerate_work(&self) -> Vec<WorkUnit> {
        self.ids.iter().cloned().map(WorkUnit::Detail).collect()
    }

    fn build_request(
        &self,
        client: &Client,
        unit: &WorkUnit,
        _cursor: Option<&str>,
    ) -> Result<Request> {
        let WorkUnit::Detail(id) = unit else {
            return Err(HarvestError::Response(format!(
                "expected a detail work unit, got {:?}",
                unit
            )));
        };

        let request = client
            .get(format!("{}{}", self.base_url, SHOW_PATH))
            .query(&[
                ("id", id.as_str()),
                ("locale", "zh-CN"),
                ("isGetLongText", "true"),
            ])
            .build()?;
        Ok(request)
    }

    fn parse_response(&self, response: &RawResponse, _unit: &WorkUnit) -> Result<ParsedPage> {
        Ok(ParsedPage::flat(process_body_response(&response.body)?))
    }

    fn to_typed_records(
        &self,
        items: Vec<Map<String, Value>>,
        _unit: &WorkUnit,
    ) -> Vec<TypedRecord> {
        items
            .into_iter()
            .map(|item| {
                TypedRecord::Body(BodyRecord::from_item(
                    item,
                    &self.collection,
                    RecordFrom::Api,
                ))
            })
            .collect()
    }
}
