// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler pieces for convenience
pub use handlers::{build_response, missing_url_response, router, ProxyResponse};
