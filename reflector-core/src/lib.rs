pub mod error;
pub mod fetch;
pub mod outcome;
pub mod rewrite;

pub use error::NetworkReason;
pub use fetch::Fetcher;
pub use outcome::FetchOutcome;
pub use rewrite::rewrite;
