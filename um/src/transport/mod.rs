//! Transport capability
//!
//! Executes a fully built request description and hands back the raw status
//! and body. Knows nothing about the API beyond HTTP itself.

mod error;
mod http;
mod types;

use async_trait::async_trait;

pub use error::TransportError;
pub use http::HttpTransport;
pub use types::{Method, RawResponse, RequestDescription};

/// Performs network calls for the user manager
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a single request; non-2xx statuses are not errors at this layer
    async fn execute(&self, request: RequestDescription) -> Result<RawResponse, TransportError>;
}
