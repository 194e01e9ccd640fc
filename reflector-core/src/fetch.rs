use crate::error::NetworkReason;
use crate::outcome::FetchOutcome;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Upper bound on response body size. The upstream origin is untrusted;
/// an unbounded read would let a single request exhaust memory.
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Performs the upstream GET and classifies the result into a
/// `FetchOutcome`. One outbound request per call, no retries.
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .default_headers(browser_headers())
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(50)
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Validate the target URL, fetch it within the time bound and
    /// classify the result. The send and the full body read race against
    /// one timer; when the timer wins, the in-flight request future is
    /// dropped, which aborts the underlying connection.
    pub async fn fetch(&self, raw_url: &str) -> FetchOutcome {
        let target = match Url::parse(raw_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return FetchOutcome::InvalidUrl {
                    reason: format!("Unsupported scheme '{}'", url.scheme()),
                };
            }
            Err(e) => {
                return FetchOutcome::InvalidUrl {
                    reason: e.to_string(),
                };
            }
        };

        debug!("Fetching {}", target);

        match tokio::time::timeout(self.timeout, self.fetch_inner(target)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Fetch of {} exceeded the {:?} bound, aborted", raw_url, self.timeout);
                FetchOutcome::Timeout
            }
        }
    }

    async fn fetch_inner(&self, target: Url) -> FetchOutcome {
        let response = match self.client.get(target).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(e),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::UpstreamError {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            };
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            debug!("Declining to rewrite content-type {:?}", content_type);
            return FetchOutcome::UnsupportedContent { content_type };
        }

        // Effective URL after redirects, the anchor for reference resolution
        let base_url = response.url().clone();

        match self.read_body(response).await {
            Ok(html) => FetchOutcome::Success { html, base_url },
            Err(reason) => FetchOutcome::NetworkFailure { reason },
        }
    }

    /// Accumulate the body up to the configured cap, then decode lossily
    /// as UTF-8.
    async fn read_body(&self, response: reqwest::Response) -> Result<String, NetworkReason> {
        if let Some(len) = response.content_length()
            && len > self.max_body_bytes as u64
        {
            return Err(NetworkReason::BodyTooLarge(self.max_body_bytes));
        }

        let mut stream = response.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkReason::Body(e.to_string()))?;
            if buf.len() + chunk.len() > self.max_body_bytes {
                return Err(NetworkReason::BodyTooLarge(self.max_body_bytes));
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_request_error(e: reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::NetworkFailure {
            reason: NetworkReason::Connect(e.to_string()),
        }
    } else {
        FetchOutcome::NetworkFailure {
            reason: NetworkReason::Request(e.to_string()),
        }
    }
}

/// Only markup payloads proceed to rewriting. Parameters such as
/// `; charset=utf-8` are ignored; a missing content-type is unsupported.
fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Headers that impersonate an ordinary desktop browser. Many origins
/// reject or alter responses for non-browser clients.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        reqwest::header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate"),
    );
    headers.insert(
        reqwest::header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert(
        reqwest::header::CONNECTION,
        HeaderValue::from_static("keep-alive"),
    );
    headers.insert(
        reqwest::header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers
}
