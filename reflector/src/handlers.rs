use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use reflector_core::{rewrite, FetchOutcome, Fetcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// The externally observable result. `content` always renders in a
/// browser viewport; `error` is present iff the fetch did not succeed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyResponse {
    fn ok(content: String) -> Self {
        Self {
            content,
            error: None,
        }
    }

    fn failed(error: String, title: &str, detail: &str) -> Self {
        Self {
            content: fallback_html(title, detail),
            error: Some(error),
        }
    }
}

pub fn router(fetcher: Arc<Fetcher>) -> Router {
    Router::new()
        .route("/proxy", get(handle_proxy).options(handle_preflight))
        .with_state(fetcher)
}

/// Every outcome, upstream failures included, leaves the proxy as
/// HTTP 200 with a JSON envelope. The consuming browser view has no
/// generic error path, so failures are data here.
pub async fn handle_proxy(
    State(fetcher): State<Arc<Fetcher>>,
    Query(params): Query<ProxyQuery>,
) -> impl IntoResponse {
    let response = match params.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            info!("Proxying {}", url);
            build_response(fetcher.fetch(url).await)
        }
        None => missing_url_response(),
    };

    (StatusCode::OK, cors_headers(), Json(response))
}

pub async fn handle_preflight() -> impl IntoResponse {
    (StatusCode::OK, cors_headers())
}

fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

/// Total mapping from fetch outcomes to the response envelope; every
/// variant has a defined rendering.
pub fn build_response(outcome: FetchOutcome) -> ProxyResponse {
    match outcome {
        FetchOutcome::Success { html, base_url } => {
            ProxyResponse::ok(rewrite(&html, &base_url))
        }
        FetchOutcome::InvalidUrl { reason } => ProxyResponse::failed(
            format!("Invalid URL: {}", reason),
            "Invalid URL",
            &format!("The requested address could not be parsed: {}.", reason),
        ),
        FetchOutcome::UpstreamError {
            status,
            status_text,
        } => ProxyResponse::failed(
            format!("Failed to fetch: {} {}", status, status_text),
            &format!("Upstream error {}", status),
            &format!("The page responded with status {} {}.", status, status_text),
        ),
        FetchOutcome::UnsupportedContent { content_type } => {
            let shown = if content_type.is_empty() {
                "unknown".to_string()
            } else {
                content_type
            };
            ProxyResponse::failed(
                format!("Only HTML pages are supported, got '{}'", shown),
                "Unsupported content",
                &format!("This proxy only rewrites HTML pages; the target served '{}'.", shown),
            )
        }
        FetchOutcome::NetworkFailure { reason } => ProxyResponse::failed(
            reason.to_string(),
            "Could not reach the page",
            &reason.to_string(),
        ),
        FetchOutcome::Timeout => ProxyResponse::failed(
            "The page took too long to respond".to_string(),
            "Timed out",
            "The page took too long to respond and the request was aborted.",
        ),
    }
}

pub fn missing_url_response() -> ProxyResponse {
    ProxyResponse::failed(
        "URL parameter is required".to_string(),
        "Missing URL",
        "Pass the page to proxy as ?url=https://example.com/.",
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Synthetic fragment returned in place of page content when the fetch
/// fails; kept simple enough to render anywhere.
fn fallback_html(title: &str, detail: &str) -> String {
    format!(
        "<div style=\"font-family: sans-serif; padding: 2em; text-align: center; color: #444;\">\
         <h2>{}</h2><p>{}</p></div>",
        escape_html(title),
        escape_html(detail)
    )
}
