//! Integration tests for `DealerClient::fetch_page` and the scrape pipeline
//! on top of it.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cnfeed_scraper::{build_dealer_url, scrape_listing, DealerClient, FieldValue, ScraperError};

/// 5-second timeout, descriptive UA, no retries.
fn test_client() -> DealerClient {
    DealerClient::new(5, "cnfeed-test/0.1", 0, 0).expect("failed to build test DealerClient")
}

fn dealer_page() -> String {
    let payload = json!({
        "dealer": {"name": "Autos Sol"},
        "vehiclesList": {
            "items": [
                {
                    "id": "58012345",
                    "title": "SEAT Ibiza 1.0 TSI Style",
                    "url": "/seat-ibiza-10-tsi-style-5p-covo.aspx?id=58012345",
                    "price": 15990,
                    "hp": null,
                    "includesTaxes": true,
                    "location": {"regionLiteral": "Madrid", "provinceIds": [28]}
                }
            ],
            "totalResults": 1
        }
    });
    format!(
        r#"<!doctype html><html><head>
<script>window.__INITIAL_PROPS__ = {payload};</script></head><body>
<div class="mt-CardAd"><a href="/seat-ibiza-10-tsi-style-5p-covo.aspx?id=58012345">SEAT Ibiza</a>
<ul><li>Gasolina</li><li>95 cv</li>
<li class="mt-CardAd-attrItemEnvironmentalLabel"><img src="/eco.svg" alt="Etiqueta C"></li></ul>
<p class="mt-CardAdPrice-infoItem">IVA incluido</p>
<p class="mt-CardAdPrice-infoItem">Garantía 12 meses</p></div>
</body></html>"#
    )
}

// ---------------------------------------------------------------------------
// happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_page_returns_body_and_pipeline_joins_dom() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/concesionario/autos-sol/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(dealer_page()),
        )
        .mount(&server)
        .await;

    let url = build_dealer_url(Some("autos-sol"), None, &server.uri()).unwrap();
    let html = test_client().fetch_page(&url).await.unwrap();
    let page = scrape_listing(&html, "https://www.coches.net").unwrap();

    assert_eq!(page.total_results, 1);
    assert_eq!(page.count(), 1);
    let row = &page.rows[0];
    assert_eq!(row.get("potencia_cv"), Some(&FieldValue::from(95_u64)));
    assert_eq!(
        row.get("enlace_abs"),
        Some(&FieldValue::from(
            "https://www.coches.net/seat-ibiza-10-tsi-style-5p-covo.aspx?id=58012345"
        ))
    );
    assert_eq!(row.get("iva_text"), Some(&FieldValue::from("IVA incluido")));
    assert_eq!(
        row.get("garantia_text"),
        Some(&FieldValue::from("Garantía 12 meses"))
    );
    assert_eq!(
        row.get("etiqueta_ambiental_alt"),
        Some(&FieldValue::from("Etiqueta C"))
    );
    assert_eq!(
        row.get("location_provinceIds"),
        Some(&FieldValue::from("28"))
    );
}

#[tokio::test]
async fn fetch_page_sends_browser_like_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    test_client()
        .fetch_page(&format!("{}/concesionario/x/", server.uri()))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let headers = &requests[0].headers;
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    assert_eq!(header("user-agent").as_deref(), Some("cnfeed-test/0.1"));
    assert_eq!(header("accept-language").as_deref(), Some("es-ES,es;q=0.9"));
    assert!(header("accept").is_some_and(|v| v.starts_with("text/html")));
}

// ---------------------------------------------------------------------------
// error statuses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_is_upstream_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/concesionario/gone/", server.uri());
    let err = test_client().fetch_page(&url).await.unwrap_err();
    match err {
        ScraperError::UpstreamStatus { status, url: got } => {
            assert_eq!(status, 404);
            assert_eq!(got, url);
        }
        other => panic!("expected UpstreamStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_upstream_status_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = DealerClient::new(5, "cnfeed-test/0.1", 3, 0).unwrap();
    let err = client
        .fetch_page(&format!("{}/concesionario/x/", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::UpstreamStatus { status: 503, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn too_many_requests_is_rate_limited_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_page(&format!("{}/concesionario/x/", server.uri()))
        .await
        .unwrap_err();
    match err {
        ScraperError::RateLimited {
            domain,
            retry_after_secs,
        } => {
            assert_eq!(domain, "127.0.0.1");
            assert_eq!(retry_after_secs, 17);
        }
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_is_retried_when_enabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = DealerClient::new(5, "cnfeed-test/0.1", 2, 0).unwrap();
    let body = client
        .fetch_page(&format!("{}/concesionario/x/", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn page_without_payload_fails_to_scrape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let html = test_client()
        .fetch_page(&format!("{}/concesionario/x/", server.uri()))
        .await
        .unwrap();
    let err = scrape_listing(&html, "https://www.coches.net").unwrap_err();
    assert!(matches!(err, ScraperError::PayloadNotFound));
}
