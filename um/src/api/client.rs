//! API client: request construction and response decoding

use std::sync::Arc;

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ApiRequest;
use crate::domain::Credentials;
use crate::error::ManagerError;
use crate::transport::{RawResponse, RequestDescription, Transport};

/// Default base URL; `{application_id}` is replaced per session
pub const DEFAULT_BASE_URL: &str = "https://api-{application_id}.sendbird.com";

const API_VERSION: &str = "v3";

/// Error payload returned by the API on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: bool,
    pub code: Option<u32>,
    pub message: String,
}

/// Builds requests for one set of credentials and executes them over a transport
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            transport,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The base URL with the application id filled in
    fn resolved_base(&self) -> String {
        self.base_url
            .replace("{application_id}", &self.credentials.application_id)
    }

    /// Turn a typed request into a transport request description
    pub fn build<R: ApiRequest>(&self, request: &R) -> Result<RequestDescription, ManagerError> {
        let base = self.resolved_base();
        let mut url =
            Url::parse(&base).map_err(|e| ManagerError::ValidationFailed(format!("invalid base url {}: {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| ManagerError::ValidationFailed(format!("base url cannot carry a path: {}", base)))?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(request.path());

        let query = request.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut description = RequestDescription::new(request.method(), url)
            .header("Content-Type", "application/json; charset=utf8")
            .header("Api-Token", self.credentials.api_token.clone());

        if let Some(body) = request.body().filter(|b| b.as_object().is_some_and(|o| !o.is_empty())) {
            let bytes = serde_json::to_vec(&body).map_err(|e| ManagerError::ValidationFailed(e.to_string()))?;
            description = description.body(bytes);
        }

        debug!(method = %description.method, url = %description.url, "ApiClient::build: built request");
        Ok(description)
    }

    /// Execute an already built request and decode the result
    pub async fn execute<T: DeserializeOwned>(&self, description: RequestDescription) -> Result<T, ManagerError> {
        let url = description.url.clone();
        let raw = self.transport.execute(description).await.map_err(|e| {
            if e.is_timeout() {
                warn!(%url, error = %e, "Request timed out");
            } else {
                warn!(%url, error = %e, "Transport failed");
            }
            ManagerError::from(e)
        })?;
        decode_response(raw)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Decode a raw response into `T`, or into the matching API error
pub fn decode_response<T: DeserializeOwned>(raw: RawResponse) -> Result<T, ManagerError> {
    if !raw.is_success() {
        debug!(status = raw.status, "decode_response: non-success status");
        let (code, message) = match serde_json::from_slice::<ApiErrorBody>(&raw.body) {
            Ok(api_error) => (api_error.code, api_error.message),
            Err(_) => (None, String::from_utf8_lossy(&raw.body).into_owned()),
        };
        return Err(ManagerError::UpstreamRejected {
            status: raw.status,
            code,
            message,
        });
    }

    serde_json::from_slice(&raw.body).map_err(|e| {
        debug!(error = %e, "decode_response: decoding failed");
        ManagerError::DecodingFailed(e.to_string())
    })
}
