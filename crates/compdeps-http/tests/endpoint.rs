//! The fetch endpoint and the rewrite middleware, driven through axum.

use axum::response::Html;
use axum::routing::get;
use axum::Router;

use compdeps_assets::AssetKind;
use compdeps_http::{DepsApp, STRATEGY_HEADER};
use compdeps_test::fixtures::{INLINE_CSS, INLINE_JS};
use compdeps_test::{sample_registry, TestClient, SAMPLE_PAGE};

fn inline_urls() -> (String, String) {
    let registry = sample_registry();
    let badge = registry.get("inline_07").unwrap();
    let url = |kind| {
        badge
            .assets
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.resource_id().to_string())
            .unwrap()
    };
    (url(AssetKind::Style), url(AssetKind::Script))
}

fn client() -> TestClient {
    let pages = Router::new()
        .route("/", get(|| async { Html(SAMPLE_PAGE) }))
        .route(
            "/fragment",
            get(|| async { Html(r#"<!-- RENDERED "card_02,c9" --><div></div>"#) }),
        )
        .route(
            "/data",
            get(|| async { r#"<!-- RENDERED "tbl_1a2b,x1" -->"# }),
        );
    TestClient::new(DepsApp::new(sample_registry()).pages(pages).into_router())
}

#[tokio::test]
async fn test_inline_content_round_trips_byte_for_byte() {
    let client = client();
    let (css_url, js_url) = inline_urls();
    assert!(js_url.starts_with("/components/cache/"));
    assert!(js_url.ends_with(".js/"));

    let js = client.get(&js_url).await;
    assert_eq!(js.status_code(), 200);
    assert_eq!(js.header("content-type"), Some("text/javascript; charset=utf-8"));
    assert_eq!(js.body, INLINE_JS.as_bytes());

    let css = client.get(&css_url).await;
    assert_eq!(css.header("content-type"), Some("text/css; charset=utf-8"));
    assert_eq!(css.body, INLINE_CSS.as_bytes());
}

#[tokio::test]
async fn test_trailing_slash_is_optional() {
    let client = client();
    let (_, js_url) = inline_urls();
    let response = client.get(js_url.trim_end_matches('/')).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body, INLINE_JS.as_bytes());
}

#[tokio::test]
async fn test_unknown_key_or_type_is_not_found() {
    let client = client();
    assert_eq!(
        client.get("/components/cache/0000000000000000.js/").await.status_code(),
        404
    );

    let (_, js_url) = inline_urls();
    let wrong_type = js_url.replace(".js/", ".txt/");
    assert_eq!(client.get(&wrong_type).await.status_code(), 404);

    let wrong_kind = js_url.replace(".js/", ".css/");
    assert_eq!(client.get(&wrong_kind).await.status_code(), 404);
}

#[tokio::test]
async fn test_html_pages_are_rewritten() {
    let response = client().get("/").await;
    assert_eq!(response.status_code(), 200);
    let html = response.text();
    assert!(!html.contains("RENDERED"));
    assert!(html.contains(r#"<head><title>t</title><link href="/tbl.css" rel="stylesheet">"#));
    assert!(html.contains(r#"<link href="/btn.css" rel="stylesheet"></head>"#));
    assert!(html.contains(r#"loadScript("js""#));
    assert_eq!(html.matches("/shared.css").count(), 2);
}

#[tokio::test]
async fn test_strategy_header_selects_fragment() {
    let response = client()
        .get_with_headers("/fragment", &[(STRATEGY_HEADER, "fragment")])
        .await;
    let html = response.text();
    assert!(html.starts_with("<div></div><script>"));
    assert!(html.contains(r#"loadScript("css""#));
    assert!(html.contains(r#"callComponent("card_02", "c9", null)"#));
}

#[tokio::test]
async fn test_ignore_header_leaves_markers() {
    let response = client()
        .get_with_headers("/fragment", &[(STRATEGY_HEADER, "ignore")])
        .await;
    assert_eq!(response.text(), r#"<!-- RENDERED "card_02,c9" --><div></div>"#);
}

#[tokio::test]
async fn test_non_html_responses_pass_through() {
    let response = client().get("/data").await;
    assert_eq!(response.text(), r#"<!-- RENDERED "tbl_1a2b,x1" -->"#);
}
