//! Search-result list page strategy
//!
//! Walks the fixed 50-page search window for one query. Three search kinds
//! map to different endpoints and parameter sets; the advanced kind adds a
//! result filter and an hour-granular time scope. Pages past the first send
//! a referer pointing at the previous page, the way a browser paging
//! through results would.

use crate::engine::strategy::{FetchStrategy, ParsedPage, RawResponse, WorkUnit};
use crate::parse::parse_list_html;
use crate::records::{BodyRecord, RecordFrom, TypedRecord};
use crate::{HarvestError, Result};
use chrono::NaiveDateTime;
use reqwest::header::REFERER;
use reqwest::{Client, Request};
use serde_json::{Map, Value};
use url::Url;

const DEFAULT_SEARCH_BASE: &str = "https://s.weibo.com";
const DEFAULT_PAGES: u32 = 50;

/// Search flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Default mixed ranking
    Composite,
    /// Realtime feed
    Realtime,
    /// Advanced search with filters and a time scope
    Advanced,
}

/// Result filter for advanced search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancedKind {
    Composite,
    Hot,
    Original,
}

/// Strategy for search-result pages of one query
pub struct SearchListStrategy {
    search_for: String,
    collection: String,
    kind: SearchKind,
    advanced_kind: AdvancedKind,
    time_start: Option<NaiveDateTime>,
    time_end: Option<NaiveDateTime>,
    pages: u32,
    base_url: String,
}

impl SearchListStrategy {
    /// Creates a composite search over the default page window
    ///
    /// Topic queries keep their surrounding `#` marks in `search_for`.
    pub fn new(search_for: &str, collection: &str) -> Self {
        Self {
            search_for: search_for.to_string(),
            collection: collection.to_string(),
            kind: SearchKind::Composite,
            advanced_kind: AdvancedKind::Composite,
            time_start: None,
            time_end: None,
            pages: DEFAULT_PAGES,
            base_url: DEFAULT_SEARCH_BASE.to_string(),
        }
    }

    pub fn kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Switches to advanced search with a filter and optional time scope
    pub fn advanced(
        mut self,
        advanced_kind: AdvancedKind,
        time_start: Option<NaiveDateTime>,
        time_end: Option<NaiveDateTime>,
    ) -> Self {
        self.kind = SearchKind::Advanced;
        self.advanced_kind = advanced_kind;
        self.time_start = time_start;
        self.time_end = time_end;
        self
    }

    pub fn pages(mut self, pages: u32) -> Self {
        self.pages = pages.max(1);
        self
    }

    /// Points the strategy at a different host (tests)
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn page_url(&self, page_index: u32) -> Result<Url> {
        let (path, extra_params): (&str, Vec<(&str, String)>) = match self.kind {
            SearchKind::Composite => ("/weibo", vec![("Refer", "weibo_weibo".to_string())]),
            SearchKind::Realtime => (
                "/realtime",
                vec![
                    ("rd", "realtime".to_string()),
                    ("tw", "realtime".to_string()),
                    ("Refer", "weibo_realtime".to_string()),
                ],
            ),
            SearchKind::Advanced => {
                let mut params = vec![("suball", "1".to_string()), ("Refer", "g".to_string())];
                match self.advanced_kind {
                    AdvancedKind::Composite => params.push(("typeall", "1".to_string())),
                    AdvancedKind::Hot => params.push(("xsort", "hot".to_string())),
                    AdvancedKind::Original => params.push(("scope", "ori".to_string())),
                }
                let fmt = |t: &Option<NaiveDateTime>| {
                    t.map(|t| t.format("%Y-%m-%d-%H").to_string())
                        .unwrap_or_default()
                };
                params.push((
                    "timescope",
                    format!("custom:{}:{}", fmt(&self.time_start), fmt(&self.time_end)),
                ));
                ("/weibo", params)
            }
        };

        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| HarvestError::Response(format!("bad search URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &self.search_for);
            for (key, value) in &extra_params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("page", &page_index.to_string());
        }
        Ok(url)
    }
}

impl FetchStrategy for SearchListStrategy {
    fn description(&self) -> String {
        format!("search pages for \"{}\"", self.search_for)
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn enumerate_work(&self) -> Vec<WorkUnit> {
        (1..=self.pages).map(WorkUnit::Page).collect()
    }

    fn build_request(
        &self,
        client: &Client,
        unit: &WorkUnit,
        _cursor: Option<&str>,
    ) -> Result<Request> {
        let WorkUnit::Page(page_index) = unit else {
            return Err(HarvestError::Response(format!(
                "expected a page work unit, got {:?}",
                unit
            )));
        };

        let mut builder = client.get(self.page_url(*page_index)?);
        if *page_index > 1 {
            builder = builder.header(REFERER, self.page_url(page_index - 1)?.to_string());
        }
        Ok(builder.build()?)
    }

    fn parse_response(&self, response: &RawResponse, _unit: &WorkUnit) -> Result<ParsedPage> {
        Ok(ParsedPage::flat(parse_list_html(&response.body)))
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
                    &self.search_for,
                    RecordFrom::Html,
                ))
            })
            .collect()
    }
}
