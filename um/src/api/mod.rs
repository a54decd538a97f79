//! Request codec for the user API
//!
//! Typed requests, URL and header construction, and decoding of raw
//! responses into typed results or API errors.

mod client;
mod requests;

use serde::de::DeserializeOwned;

pub use client::{ApiClient, ApiErrorBody, DEFAULT_BASE_URL, decode_response};
pub use requests::{CreateUserRequest, GetUserRequest, ListUsersRequest, UpdateUserRequest};

use crate::transport::Method;

/// A typed call against the user API
pub trait ApiRequest: Send + 'static {
    type Response: DeserializeOwned + Send + 'static;

    fn method(&self) -> Method;

    /// Path segments below `/v3`, e.g. `["users", "u1"]`
    fn path(&self) -> Vec<String>;

    fn query(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn body(&self) -> Option<serde_json::Value> {
        None
    }

    /// Human readable target for logs, e.g. `/users/u1`
    fn endpoint(&self) -> String {
        format!("/{}", self.path().join("/"))
    }
}
