use reflector::handlers::{build_response, missing_url_response, router, ProxyResponse};
use reflector_core::{FetchOutcome, Fetcher, NetworkReason};
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_success_outcome_rewrites_content() {
    let outcome = FetchOutcome::Success {
        html: r#"<img src="/a.png">"#.to_string(),
        base_url: Url::parse("https://ex.com/dir/page.html").unwrap(),
    };

    let response = build_response(outcome);

    assert_eq!(response.content, r#"<img src="https://ex.com/a.png">"#);
    assert_eq!(response.error, None);
}

#[test]
fn test_every_failure_variant_renders_content_and_error() {
    let outcomes = vec![
        FetchOutcome::InvalidUrl {
            reason: "relative URL without a base".to_string(),
        },
        FetchOutcome::UpstreamError {
            status: 503,
            status_text: "Service Unavailable".to_string(),
        },
        FetchOutcome::UnsupportedContent {
            content_type: "application/pdf".to_string(),
        },
        FetchOutcome::NetworkFailure {
            reason: NetworkReason::Connect("connection refused".to_string()),
        },
        FetchOutcome::Timeout,
    ];

    for outcome in outcomes {
        let label = format!("{:?}", outcome);
        let response = build_response(outcome);
        assert!(
            !response.content.is_empty(),
            "fallback content missing for {}",
            label
        );
        assert!(
            response.content.starts_with("<div"),
            "fallback should be renderable HTML for {}",
            label
        );
        assert!(response.error.is_some(), "error missing for {}", label);
    }
}

#[test]
fn test_upstream_404_mentions_status() {
    let response = build_response(FetchOutcome::UpstreamError {
        status: 404,
        status_text: "Not Found".to_string(),
    });

    assert!(response.content.contains("404"));
    assert!(response.error.unwrap().contains("404"));
}

#[test]
fn test_missing_url_fallback() {
    let response = missing_url_response();

    assert_eq!(response.error, Some("URL parameter is required".to_string()));
    assert!(response.content.contains("url="));
}

#[test]
fn test_unsupported_content_names_the_type() {
    let response = build_response(FetchOutcome::UnsupportedContent {
        content_type: "image/png".to_string(),
    });

    assert!(response.error.unwrap().contains("image/png"));
}

#[test]
fn test_fallback_detail_is_escaped() {
    let response = build_response(FetchOutcome::UnsupportedContent {
        content_type: "<script>alert(1)</script>".to_string(),
    });

    assert!(!response.content.contains("<script>"));
}

#[test]
fn test_envelope_omits_error_on_success() {
    let response = build_response(FetchOutcome::Success {
        html: "<html></html>".to_string(),
        base_url: Url::parse("https://ex.com/").unwrap(),
    });

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value.get("content"), Some(&serde_json::json!("<html></html>")));
    assert!(value.get("error").is_none());
}

#[test]
fn test_envelope_carries_error_on_failure() {
    let response = build_response(FetchOutcome::Timeout);

    let value = serde_json::to_value(&response).unwrap();
    assert!(value.get("content").and_then(|v| v.as_str()).is_some());
    assert_eq!(
        value.get("error").and_then(|v| v.as_str()),
        Some("The page took too long to respond")
    );
}

async fn spawn_proxy() -> String {
    let fetcher = Arc::new(Fetcher::with_timeout(5));
    let app = router(fetcher);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_proxy_endpoint_end_to_end() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(br#"<html><body><a href="/next">next</a></body></html>"#.as_slice()),
        )
        .mount(&upstream)
        .await;

    let proxy = spawn_proxy().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/proxy", proxy))
        .query(&[("url", format!("{}/page", upstream.uri()))])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let body: ProxyResponse = response.json().await.unwrap();
    assert_eq!(body.error, None);
    assert!(body
        .content
        .contains(&format!(r#"href="{}/next""#, upstream.uri())));
}

#[tokio::test]
async fn test_proxy_upstream_error_still_returns_200() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let proxy = spawn_proxy().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/proxy", proxy))
        .query(&[("url", format!("{}/gone", upstream.uri()))])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: ProxyResponse = response.json().await.unwrap();
    assert!(body.error.is_some());
    assert!(body.content.contains("404"));
}

#[tokio::test]
async fn test_proxy_missing_url_parameter() {
    let proxy = spawn_proxy().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/proxy", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: ProxyResponse = response.json().await.unwrap();
    assert_eq!(body.error, Some("URL parameter is required".to_string()));
}

#[tokio::test]
async fn test_options_preflight() {
    let proxy = spawn_proxy().await;
    let client = reqwest::Client::new();

    let response = client
        .request(reqwest::Method::OPTIONS, format!("{}/proxy", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-methods")
            .and_then(|v| v.to_str().ok()),
        Some("GET, OPTIONS")
    );
    assert!(response.bytes().await.unwrap().is_empty());
}
