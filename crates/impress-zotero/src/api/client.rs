//! Paginated client for the Zotero local HTTP API
//!
//! Collections are fetched by asking for the first page alone, reading the
//! `Total-Results` header, then pulling the remaining pages through a
//! bounded pool. Results come back in page order no matter which request
//! finished first.

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;

use super::types::{ApiChildItem, ApiCollection, ApiRegularItem, RawItem};
use crate::config::MirrorConfig;
use crate::error::Result;
use crate::http::HttpClient;

pub const TOTAL_RESULTS_HEADER: &str = "Total-Results";

/// Item types that are children rather than regular items
const CHILD_TYPE_FILTERS: &[(&str, &str)] = &[
    ("itemType", "-attachment"),
    ("itemType", "-annotation"),
    ("itemType", "-note"),
];

/// One page of a paginated listing
#[derive(Debug)]
pub struct Page<T> {
    /// Size of the whole result set, from `Total-Results`
    pub total: usize,
    pub records: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct ZoteroApiClient {
    http: HttpClient,
    base_url: String,
    page_size: usize,
    max_concurrent_pages: usize,
}

impl ZoteroApiClient {
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(config.api_key.as_deref(), config.request_timeout())?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            page_size: config.page_size,
            max_concurrent_pages: config.max_concurrent_pages,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Reachability check; any failure reads as `false`
    pub async fn ping(&self) -> bool {
        let url = self.url("items");
        match self
            .http
            .get_with_params(&url, &[("limit", "1"), ("format", "json")])
            .await
        {
            Ok(response) => response.is_success(),
            Err(e) => {
                tracing::debug!("Ping to {} failed: {}", url, e);
                false
            }
        }
    }

    /// Fetch a single page starting at record `start`
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        start: usize,
    ) -> Result<Page<T>> {
        let limit = self.page_size.to_string();
        let start = start.to_string();
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.extend([
            ("format", "json"),
            ("include", "data"),
            ("limit", limit.as_str()),
            ("start", start.as_str()),
        ]);

        let response = self
            .http
            .get_with_params(&self.url(path), &query)
            .await?
            .error_for_status()?;

        let total = response
            .header(TOTAL_RESULTS_HEADER)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let raw: Vec<serde_json::Value> = response.json()?;

        Ok(Page {
            total,
            records: decode_records(path, raw),
        })
    }

    /// Fetch every record of a listing.
    ///
    /// `on_batch` sees page 0 before any other page is requested, then each
    /// later page in the order it arrives. The returned records are in page
    /// order.
    pub async fn fetch_all<T, F>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        mut on_batch: F,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: FnMut(&[T]),
    {
        let first = self.fetch_page::<T>(path, params, 0).await?;
        on_batch(&first.records);

        let total = first.total;
        let mut results = first.records;
        if total <= self.page_size {
            return Ok(results);
        }

        let starts: Vec<usize> = (self.page_size..total).step_by(self.page_size).collect();
        tracing::debug!(
            "Fetching {} more pages of /{} ({} records)",
            starts.len(),
            path,
            total
        );

        let mut slots: Vec<Option<Vec<T>>> = std::iter::repeat_with(|| None)
            .take(starts.len())
            .collect();

        let mut pages = stream::iter(starts.into_iter().enumerate())
            .map(|(slot, start)| async move {
                self.fetch_page::<T>(path, params, start)
                    .await
                    .map(|page| (slot, page.records))
            })
            .buffer_unordered(self.max_concurrent_pages);

        while let Some(page) = pages.next().await {
            let (slot, records) = page?;
            on_batch(&records);
            slots[slot] = Some(records);
        }

        for records in slots.into_iter().flatten() {
            results.extend(records);
        }
        Ok(results)
    }

    /// All regular items (no attachments, annotations or notes)
    pub async fn get_all_items<F>(&self, on_batch: F) -> Result<Vec<ApiRegularItem>>
    where
        F: FnMut(&[ApiRegularItem]),
    {
        self.fetch_all("items", CHILD_TYPE_FILTERS, on_batch).await
    }

    /// A single item of any type; `None` when the API answers 404
    pub async fn get_item(&self, key: &str) -> Result<Option<RawItem>> {
        let response = self
            .http
            .get_with_params(
                &self.url(&format!("items/{}", key)),
                &[("format", "json"), ("include", "data")],
            )
            .await?;

        if response.status == 404 {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.json()?))
    }

    /// Direct children of an item, optionally only those of one type
    pub async fn get_children(
        &self,
        item_key: &str,
        item_type: Option<&str>,
    ) -> Result<Vec<ApiChildItem>> {
        let path = format!("items/{}/children", item_key);
        let params: Vec<(&str, &str)> = item_type.map(|t| ("itemType", t)).into_iter().collect();
        self.fetch_all(&path, &params, |_| {}).await
    }

    /// The full collection list; parents are referenced by key
    pub async fn get_collections(&self) -> Result<Vec<ApiCollection>> {
        self.fetch_all("collections", &[], |_| {}).await
    }
}

/// Decode records one by one so a malformed record only costs itself
fn decode_records<T: DeserializeOwned>(path: &str, raw: Vec<serde_json::Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|value| {
            let key = value
                .get("key")
                .and_then(|k| k.as_str())
                .unwrap_or("?")
                .to_string();
            match serde_json::from_value::<T>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping malformed record {} from /{}: {}", key, path, e);
                    None
                }
            }
        })
        .collect()
}
