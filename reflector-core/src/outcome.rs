use crate::error::NetworkReason;
use url::Url;

/// Classified result of one upstream fetch. Exactly one variant per
/// request; this is the sole handoff between the fetcher and the
/// response builder.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Reachable host, 2xx status, HTML content. `base_url` is the
    /// effective URL after redirects, the anchor for relative-reference
    /// resolution.
    Success { html: String, base_url: Url },
    /// The `url` parameter did not parse as an absolute http(s) URL.
    InvalidUrl { reason: String },
    /// Upstream answered with a non-2xx status.
    UpstreamError { status: u16, status_text: String },
    /// Upstream answered with something other than HTML.
    UnsupportedContent { content_type: String },
    /// DNS, connection or body-read failure.
    NetworkFailure { reason: NetworkReason },
    /// The fetch exceeded the configured time bound and was aborted.
    Timeout,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}
