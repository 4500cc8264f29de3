//! Integration tests for `ListingClient` and the acquisition loop against a
//! local `wiremock` server.

use carlist_core::DelayRange;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use carlist_scraper::{
    run_acquisition, AcquisitionConfig, Checkpoint, ClientConfig, ListingClient, PageKey,
    PageSource, ProxyPool, ScraperError,
};

fn test_client(base_url: &str, max_attempts: u32) -> ListingClient {
    let config = ClientConfig {
        base_url: base_url.to_owned(),
        timeout_secs: 5,
        max_attempts,
        request_delay: DelayRange::zero(),
        retry_backoff: DelayRange::zero(),
    };
    ListingClient::new(config, ProxyPool::default()).expect("failed to build test ListingClient")
}

const TWO_CARDS: &str = r#"<html><body><ul class="viewlist_ul">
  <li class="cards-li" carname="宝马X3 2019款 xDrive28i">
    <p class="cards-unit">3.5万公里／2019-06／北京</p>
    <span class="pirce"><em>25.8</em>万</span>
  </li>
  <li class="cards-li" carname="本田雅阁 2020款 260TURBO">
    <p class="cards-unit">2.1万公里／2020-03／北京</p>
    <span class="pirce"><em>15.6</em>万</span>
  </li>
</ul></body></html>"#;

// ---------------------------------------------------------------------------
// fetch_page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_page_requests_listing_path_with_page_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bj/list/suv/"))
        .and(query_param("page", "2"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TWO_CARDS))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri(), 1);
    let body = client
        .fetch_page(&PageKey::new("bj", "suv/", 2))
        .await
        .expect("expected page body");

    assert!(body.contains("cards-li"));
}

#[tokio::test]
async fn fetch_page_retries_server_error_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sh/list/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sh/list/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TWO_CARDS))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri(), 3);
    let result = client.fetch_page(&PageKey::new("sh", "", 1)).await;

    assert!(result.is_ok(), "expected Ok after retries, got: {result:?}");
}

#[tokio::test]
async fn fetch_page_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri(), 3);
    let result = client.fetch_page(&PageKey::new("gz", "", 1)).await;

    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 429, .. })),
        "expected 429, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_page_does_not_retry_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri(), 3);
    let result = client.fetch_page(&PageKey::new("gz", "", 1)).await;

    assert!(matches!(
        result,
        Err(ScraperError::UnexpectedStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn fetch_page_blank_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   "))
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri(), 1);
    let result = client.fetch_page(&PageKey::new("bj", "", 1)).await;

    assert!(matches!(result, Err(ScraperError::EmptyBody { .. })));
}

#[tokio::test]
async fn fetch_page_decodes_declared_charset() {
    let server = MockServer::start().await;
    // "宝马" in GBK
    let gbk: Vec<u8> = vec![0xB1, 0xA6, 0xC2, 0xED];
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=gbk")
                .set_body_bytes(gbk),
        )
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri(), 1);
    let body = client.fetch_page(&PageKey::new("bj", "", 1)).await.unwrap();

    assert_eq!(body, "宝马");
}

// ---------------------------------------------------------------------------
// acquisition end to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn acquisition_collects_from_mock_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bj/list/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TWO_CARDS))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    let config = AcquisitionConfig {
        target_count: 50,
        locales: vec!["bj".to_owned()],
        categories: vec![String::new(), "suv/".to_owned()],
        max_pages_per_locale: 5,
        locale_floor: 1,
        locale_ceiling: 100,
        checkpoint_interval: 1000,
        page_delay: DelayRange::zero(),
        locale_pause: DelayRange::zero(),
        reference_year: 2024,
    };
    let mut client = test_client(&server.uri(), 1);
    let mut state = Checkpoint::default();

    let report = run_acquisition(&config, &mut client, None, &mut state).await;

    assert_eq!(state.records.len(), 2);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(state.records[0].brand, "宝马");
    assert_eq!(state.records[1].brand, "本田");
    assert_eq!(state.records[1].mileage_km, 21_000);
    assert!(state.visited.contains("bj||1"));
    assert!(state.visited.contains("bj||2"));
    assert!(state.visited.contains("bj|suv/|1"));
}
