//! Shared fixtures: synthetic Zotero records and a mocked local API

#![allow(dead_code)]

use std::time::Duration;

use impress_zotero::MirrorConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_ROOT: &str = "/api/users/0";
pub const PAGE_SIZE: usize = 100;

pub fn library(id: i64) -> Value {
    json!({"type": "user", "id": id, "name": "My Library"})
}

/// A regular item record as `/items?include=data` returns it
pub fn item_json(key: &str, title: &str, citekey: Option<&str>) -> Value {
    json!({
        "key": key,
        "version": 1,
        "library": library(1),
        "meta": {"numChildren": 0},
        "data": {
            "key": key,
            "version": 1,
            "itemType": "journalArticle",
            "title": title,
            "creators": [{"creatorType": "author", "firstName": "Ada", "lastName": "Lovelace"}],
            "citationKey": citekey.unwrap_or_default(),
            "publicationTitle": "Journal of Tests",
            "collections": [],
            "tags": [{"tag": "fixture"}],
            "dateAdded": "2024-01-01T00:00:00Z",
            "dateModified": "2024-01-02T00:00:00Z"
        }
    })
}

/// `count` items keyed `ITEM0000`, `ITEM0001`, ... with distinct titles
pub fn numbered_items(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| item_json(&format!("ITEM{:04}", i), &format!("Paper number {}", i), None))
        .collect()
}

pub fn annotation_json(key: &str, parent: &str, text: &str, tags: &[&str]) -> Value {
    let tags: Vec<Value> = tags.iter().map(|t| json!({"tag": t})).collect();
    json!({
        "key": key,
        "version": 1,
        "library": library(1),
        "data": {
            "key": key,
            "itemType": "annotation",
            "parentItem": parent,
            "annotationType": "highlight",
            "annotationText": text,
            "annotationComment": "",
            "annotationColor": "#ffd400",
            "annotationPageLabel": "3",
            "annotationSortIndex": "00002|000100|00050",
            "annotationPosition": "{\"pageIndex\":2,\"rects\":[[1,2,3,4]]}",
            "tags": tags
        }
    })
}

pub fn attachment_json(key: &str, parent: &str, content_type: &str) -> Value {
    json!({
        "key": key,
        "version": 1,
        "library": library(1),
        "meta": {"numChildren": 2},
        "data": {
            "key": key,
            "itemType": "attachment",
            "parentItem": parent,
            "title": "Full Text PDF",
            "linkMode": "imported_file",
            "contentType": content_type,
            "filename": format!("{}.pdf", key)
        }
    })
}

pub fn note_json(key: &str, parent: &str, html: &str) -> Value {
    json!({
        "key": key,
        "version": 1,
        "library": library(1),
        "data": {
            "key": key,
            "itemType": "note",
            "parentItem": parent,
            "note": html
        }
    })
}

/// Config pointing at the mock server, with short windows for tests
pub fn test_config(server: &MockServer) -> MirrorConfig {
    MirrorConfig {
        host: "127.0.0.1".to_string(),
        port: server.address().port(),
        page_size: PAGE_SIZE,
        max_concurrent_pages: 5,
        debounce_ms: 50,
        index_heap_bytes: 15_000_000,
        ..MirrorConfig::default()
    }
}

pub fn listing(records: &[Value], total: usize) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Total-Results", total.to_string().as_str())
        .set_body_json(records)
}

/// Answer the reachability check
pub async fn mount_ping(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{}/items", API_ROOT)))
        .and(query_param("limit", "1"))
        .respond_with(listing(&[], 0))
        .mount(server)
        .await;
}

pub async fn mount_collections(server: &MockServer, collections: &[Value]) {
    Mock::given(method("GET"))
        .and(path(format!("{}/collections", API_ROOT)))
        .respond_with(listing(collections, collections.len()))
        .mount(server)
        .await;
}

/// Serve `items` as the paginated regular-item listing.
///
/// Page `i` answers after `delay(i)`.
pub async fn mount_items_with_delay(
    server: &MockServer,
    items: &[Value],
    delay: impl Fn(usize) -> Duration,
) {
    let total = items.len();
    let pages = total.div_ceil(PAGE_SIZE).max(1);
    for page in 0..pages {
        let start = page * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(total);
        Mock::given(method("GET"))
            .and(path(format!("{}/items", API_ROOT)))
            .and(query_param("start", start.to_string().as_str()))
            .respond_with(listing(&items[start..end], total).set_delay(delay(page)))
            .mount(server)
            .await;
    }
}

pub async fn mount_items(server: &MockServer, items: &[Value]) {
    mount_items_with_delay(server, items, |_| Duration::ZERO).await;
}

/// Ping, an empty collection list and the given items
pub async fn mount_library(server: &MockServer, items: &[Value]) {
    mount_ping(server).await;
    mount_collections(server, &[]).await;
    mount_items(server, items).await;
}

pub async fn mount_item(server: &MockServer, key: &str, record: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{}/items/{}", API_ROOT, key)))
        .respond_with(ResponseTemplate::new(200).set_body_json(record))
        .mount(server)
        .await;
}

pub async fn mount_missing_item(server: &MockServer, key: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{}/items/{}", API_ROOT, key)))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(server)
        .await;
}

pub async fn mount_children(server: &MockServer, parent: &str, item_type: &str, records: &[Value]) {
    Mock::given(method("GET"))
        .and(path(format!("{}/items/{}/children", API_ROOT, parent)))
        .and(query_param("itemType", item_type))
        .respond_with(listing(records, records.len()))
        .mount(server)
        .await;
}

/// Requests made for the first page of the regular-item listing, i.e. full loads
pub async fn full_load_count(server: &MockServer) -> usize {
    let listing_path = format!("{}/items", API_ROOT);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| {
            r.url.path() == listing_path
                && r.url.query_pairs().any(|(k, v)| k == "start" && v == "0")
        })
        .count()
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}
