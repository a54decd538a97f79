//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use super::{RawResponse, RequestDescription, Transport, TransportError};

/// Transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        debug!(?timeout, "HttpTransport::new: called");
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: RequestDescription) -> Result<RawResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "HttpTransport::execute: called");
        let mut builder = self.http.request(request.method.into(), request.url);
        for (name, value) in request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header name {:?}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|e| TransportError::InvalidRequest(format!("value of header {}: {}", name, e)))?;
            builder = builder.header(header_name, header_value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                debug!("HttpTransport::execute: timed out");
                TransportError::Timeout(self.timeout)
            } else {
                debug!(error = %e, "HttpTransport::execute: network error");
                TransportError::Network(e)
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(status, len = body.len(), "HttpTransport::execute: response");
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Method;
    use reqwest::Url;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_execute_sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/users"))
            .and(header("Api-Token", "token-1"))
            .and(body_string(r#"{"user_id":"u1"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"user_id":"u1"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/v3/users", server.uri())).unwrap();
        let request = RequestDescription::new(Method::Post, url)
            .header("Api-Token", "token-1")
            .body(br#"{"user_id":"u1"}"#.to_vec());

        let response = transport.execute(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"user_id":"u1"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/v3/users/nobody", server.uri())).unwrap();

        let response = transport.execute(RequestDescription::new(Method::Get, url)).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_millis(100)).unwrap();
        let url = Url::parse(&format!("{}/v3/users", server.uri())).unwrap();

        let err = transport.execute(RequestDescription::new(Method::Get, url)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_unencodable_header_is_invalid_request() {
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse("http://127.0.0.1:1/v3/users").unwrap();
        let request = RequestDescription::new(Method::Get, url).header("Api-Token", "token\nwith-newline");

        let err = transport.execute(request).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(ref msg) if msg.contains("Api-Token")));
        assert!(!err.is_timeout());
    }
}
