use thiserror::Error;

/// Connection-level failure reasons, distinct from timeouts and upstream
/// status errors which get their own `FetchOutcome` variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkReason {
    #[error("Could not connect to host: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Response body exceeded the {0} byte limit")]
    BodyTooLarge(usize),
}
