//! Fetch client against a mocked local API

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use common::*;
use impress_zotero::{MirrorError, ZoteroApiClient};
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Serves the item listing page by page and records when each later page
/// was requested; every page after the first answers after `delay`
struct TimedPages {
    items: Vec<Value>,
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl Respond for TimedPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let start: usize = request
            .url
            .query_pairs()
            .find(|(name, _)| name == "start")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(0);
        let end = (start + PAGE_SIZE).min(self.items.len());
        let page = listing(&self.items[start..end], self.items.len());
        if start == 0 {
            return page;
        }
        self.arrivals.lock().unwrap().push(Instant::now());
        page.set_delay(self.delay)
    }
}

#[tokio::test]
async fn test_pagination_preserves_server_order() {
    let server = MockServer::start().await;
    let items = numbered_items(250);
    // Later pages answer first so arrival order differs from page order
    mount_items_with_delay(&server, &items, |page| match page {
        1 => Duration::from_millis(300),
        2 => Duration::from_millis(50),
        _ => Duration::ZERO,
    })
    .await;

    let client = ZoteroApiClient::new(&test_config(&server)).unwrap();
    let batches: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&batches);

    let all = client
        .get_all_items(|batch| {
            if let Some(first) = batch.first() {
                seen.lock().unwrap().push(first.key.clone());
            }
        })
        .await
        .unwrap();

    assert_eq!(all.len(), 250);
    let keys: Vec<String> = all.iter().map(|r| r.key.clone()).collect();
    let expected: Vec<String> = (0..250).map(|i| format!("ITEM{:04}", i)).collect();
    assert_eq!(keys, expected);

    let batches = batches.lock().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0], "ITEM0000");
    assert_eq!(batches[1], "ITEM0200");
    assert_eq!(batches[2], "ITEM0100");
}

#[tokio::test]
async fn test_page_requests_bounded_by_max_concurrent_pages() {
    let server = MockServer::start().await;
    let items = numbered_items(1100);
    let arrivals: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    Mock::given(method("GET"))
        .and(path(format!("{}/items", API_ROOT)))
        .respond_with(TimedPages {
            items,
            arrivals: Arc::clone(&arrivals),
            delay: Duration::from_millis(300),
        })
        .mount(&server)
        .await;

    let config = test_config(&server);
    assert_eq!(config.max_concurrent_pages, 5);
    let client = ZoteroApiClient::new(&config).unwrap();
    let all = client.get_all_items(|_| {}).await.unwrap();

    let keys: Vec<String> = all.iter().map(|r| r.key.clone()).collect();
    let expected: Vec<String> = (0..1100).map(|i| format!("ITEM{:04}", i)).collect();
    assert_eq!(keys, expected);

    // Ten later pages, each held for 300ms: at most five may be in flight
    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 10);
    let window = Duration::from_millis(150);
    let busiest = arrivals
        .iter()
        .map(|&t| arrivals.iter().filter(|&&u| u >= t && u - t < window).count())
        .max()
        .unwrap();
    assert_eq!(busiest, 5);
}

#[tokio::test]
async fn test_single_page_needs_one_request() {
    let server = MockServer::start().await;
    mount_items(&server, &numbered_items(42)).await;

    let client = ZoteroApiClient::new(&test_config(&server)).unwrap();
    let all = client.get_all_items(|_| {}).await.unwrap();

    assert_eq!(all.len(), 42);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_malformed_record_skipped_not_fatal() {
    let server = MockServer::start().await;
    let mut items = numbered_items(3);
    items.insert(1, serde_json::json!({"key": "BROKEN01", "data": 17}));
    Mock::given(method("GET"))
        .and(path(format!("{}/items", API_ROOT)))
        .respond_with(listing(&items, items.len()))
        .mount(&server)
        .await;

    let client = ZoteroApiClient::new(&test_config(&server)).unwrap();
    let all = client.get_all_items(|_| {}).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_get_item_not_found_is_none() {
    let server = MockServer::start().await;
    mount_missing_item(&server, "MISSING1").await;

    let client = ZoteroApiClient::new(&test_config(&server)).unwrap();
    assert!(client.get_item("MISSING1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_item_server_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/items/BROKEN01", API_ROOT)))
        .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
        .mount(&server)
        .await;

    let client = ZoteroApiClient::new(&test_config(&server)).unwrap();
    let err = client.get_item("BROKEN01").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("500"));
    assert!(matches!(err, MirrorError::Http(_)));
}

#[tokio::test]
async fn test_allowed_request_header_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/items", API_ROOT)))
        .and(header("Zotero-Allowed-Request", "1"))
        .respond_with(listing(&[], 0))
        .expect(1)
        .mount(&server)
        .await;

    let client = ZoteroApiClient::new(&test_config(&server)).unwrap();
    assert!(client.ping().await);
}

#[tokio::test]
async fn test_ping_false_when_api_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Local API is not enabled"))
        .mount(&server)
        .await;

    let client = ZoteroApiClient::new(&test_config(&server)).unwrap();
    assert!(!client.ping().await);
}

#[tokio::test]
async fn test_children_filtered_by_type() {
    let server = MockServer::start().await;
    mount_children(
        &server,
        "ATTACH01",
        "annotation",
        &[annotation_json("ANNO0001", "ATTACH01", "first", &[])],
    )
    .await;

    let client = ZoteroApiClient::new(&test_config(&server)).unwrap();
    let children = client.get_children("ATTACH01", Some("annotation")).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].key, "ANNO0001");
}
