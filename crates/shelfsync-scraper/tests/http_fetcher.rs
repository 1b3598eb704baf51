//! Integration tests for `HttpPageFetcher` driven by `crawl`.
//!
//! Uses `wiremock` to stand up a local listing API for each test so no real
//! network traffic is made. Pages are told apart by the `PageNumber` field of
//! the POSTed payload.

use std::io::Write;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfsync_scraper::{
    crawl, CrawlConfig, CrawlStatus, HttpPageFetcher, ListingQuery, PageFetcher,
    ProductUrlBuilder, ScraperError,
};

const LISTING_PATH: &str = "/api/product/productlistdata";

fn query() -> ListingQuery {
    ListingQuery {
        search_text: "s".to_owned(),
        page_size: 2,
        sort_order: "rdesc".to_owned(),
        customer_settings: "opaque".to_owned(),
        api_token: "listing-token".to_owned(),
    }
}

/// Builds a fetcher for the mock server: 5-second timeout, no retries.
fn test_fetcher(server: &MockServer) -> HttpPageFetcher {
    HttpPageFetcher::new(&server.uri(), LISTING_PATH, query(), 5, "shelfsync-test/0.1")
        .expect("failed to build test HttpPageFetcher")
}

fn page_json(current: u32, total: u32, ids: &[u64]) -> serde_json::Value {
    let products: Vec<_> = ids
        .iter()
        .map(|id| json!({"ProductID": id, "Name": format!("Product {id}"), "SalesPrice": 10.5}))
        .collect();
    json!({"CurrentPage": current, "TotalPages": total, "Products": products})
}

fn page_matcher(page: u32) -> impl wiremock::Match {
    body_partial_json(json!({"model": {"DisplaySettings": {"PageNumber": page}}}))
}

async fn mount_page(server: &MockServer, page: u32, body: &serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(page_matcher(page))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn run_crawl(server: &MockServer) -> shelfsync_scraper::CrawlOutcome {
    let fetcher = test_fetcher(server);
    let urls = ProductUrlBuilder::new(&server.uri(), "/p/");
    crawl(
        &fetcher,
        &urls,
        &CrawlConfig::default(),
        &CancellationToken::new(),
    )
    .await
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn crawl_fetches_single_page_once() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &page_json(1, 1, &[1, 2])).await;

    let outcome = run_crawl(&server).await;

    assert!(outcome.is_complete(), "got: {:?}", outcome.status);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.pages_fetched, 1);
}

#[tokio::test]
async fn crawl_walks_every_reported_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &page_json(1, 3, &[1, 2])).await;
    mount_page(&server, 2, &page_json(2, 3, &[3, 4])).await;
    mount_page(&server, 3, &page_json(3, 3, &[5])).await;

    let outcome = run_crawl(&server).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.pages_fetched, 3);
    let ids: Vec<_> = outcome.records.iter().map(|r| r.product_id()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(
        outcome.records[0].product_url(),
        format!("{}/p/1", server.uri())
    );
}

#[tokio::test]
async fn crawl_decodes_brotli_body_without_content_encoding() {
    let server = MockServer::start().await;
    let plain = serde_json::to_vec(&page_json(1, 1, &[42])).unwrap();
    let mut compressed = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut compressed, 4096, 5, 22);
        writer.write_all(&plain).unwrap();
    }

    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(compressed))
        .mount(&server)
        .await;

    let outcome = run_crawl(&server).await;

    assert!(outcome.is_complete(), "got: {:?}", outcome.status);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].product_id(), "42");
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_sends_listing_headers_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(header("Apitoken", "\"listing-token\""))
        .and(header("Origin", server.uri().as_str()))
        .and(header("Accept", "*/*"))
        .and(body_partial_json(json!({
            "model": {
                "ApiToken": "listing-token",
                "CurrentCustomerSettings": "opaque",
                "FilteringCriterias": {"SearchTextToFilterBy": "s"},
                "DisplaySettings": {"PageNumber": 4, "PageSize": "2"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(4, 4, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let page = test_fetcher(&server).fetch_page(4, &CancellationToken::new()).await.unwrap();

    assert_eq!(page.status, 200);
    assert!(!page.body.is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_error_on_second_page_halts_with_first_page_records() {
    let server = MockServer::start().await;
    mount_page(&server, 1, &page_json(1, 3, &[1, 2])).await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(page_matcher(2))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_crawl(&server).await;

    assert!(
        matches!(
            outcome.status,
            CrawlStatus::Halted {
                reason: ScraperError::UnexpectedStatus { status: 502, .. }
            }
        ),
        "got: {:?}",
        outcome.status
    );
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn malformed_page_halts_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Products": ["#))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_crawl(&server).await;

    assert!(matches!(
        outcome.status,
        CrawlStatus::Halted {
            reason: ScraperError::Decode { .. }
        }
    ));
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn rate_limit_without_retries_is_returned_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_fetcher(&server)
        .fetch_page(1, &CancellationToken::new())
        .await.unwrap_err();

    assert!(
        matches!(
            err,
            ScraperError::RateLimited {
                retry_after_secs: 30,
                ..
            }
        ),
        "expected RateLimited, got: {err:?}"
    );
}

#[tokio::test]
async fn rate_limit_is_retried_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1, 1, &[9])))
        .mount(&server)
        .await;

    let fetcher = test_fetcher(&server).with_retries(2, 0);
    let page = fetcher
        .fetch_page(1, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.status, 200);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn cancellation_ends_rate_limit_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "86400"))
        .expect(1)
        .mount(&server)
        .await;
    let fetcher = test_fetcher(&server).with_retries(3, 600);
    let urls = ProductUrlBuilder::new(&server.uri(), "/p/");
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        crawl(&fetcher, &urls, &CrawlConfig::default(), &cancel),
    )
    .await
    .expect("crawl should stop once the token is cancelled");

    assert!(
        matches!(outcome.status, CrawlStatus::Cancelled),
        "got: {:?}",
        outcome.status
    );
    assert_eq!(outcome.pages_fetched, 0);
}
