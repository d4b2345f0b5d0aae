//! HTTP transport used by the REST adapters.
//!
//! Adapters only see [`HttpTransport`]; the production implementation is
//! [`ReqwestTransport`], tests script responses with [`mock::RecordingTransport`]
//! or the generated `MockHttpTransport`.

pub mod mock;

pub use mock::RecordingTransport;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Outbound JSON POST.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn new(url: impl Into<String>, body: serde_json::Value, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with the given name, case-insensitive.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with the given name, case-insensitive.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decode the body, returning `None` when it is not the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Failure before any backend status was received.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub timed_out: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::timeout(format!("request timed out: {}", err))
        } else {
            TransportError::new(format!("request failed: {}", err))
        }
    }
}

/// A black-box HTTP client: one POST in, one status and body out.
///
/// Implementations must be safe to share between concurrent sends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`.
///
/// `reqwest::Client` pools connections internally and is safe for
/// concurrent use, so one instance can serve every send of an adapter.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

/// Caller headers as a map; a repeated name keeps the last value.
fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::new(format!("invalid header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::new(format!("invalid value for header '{}': {}", name, e))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        // Headers go in before `.json()`, which only adds a content type when none is set.
        let response = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .headers(header_map(&request.headers)?)
            .json(&request.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        debug!(url = %request.url, status, "Transport call completed");

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Deserialize)]
    struct Id {
        id: String,
    }

    #[test]
    fn test_request_headers() {
        let request =
            TransportRequest::new("https://example.com", json!({}), Duration::from_secs(1))
                .header("Authorization", "Bearer key");
        assert_eq!(request.header_value("authorization"), Some("Bearer key"));
        assert!(request.header_value("api-key").is_none());
    }

    #[test]
    fn test_response_json() {
        let response = TransportResponse::new(200, r#"{"id": "abc"}"#);
        assert_eq!(response.json::<Id>().map(|r| r.id).as_deref(), Some("abc"));
        assert!(TransportResponse::new(502, "<html>").json::<Id>().is_none());
    }

    #[test]
    fn test_response_headers() {
        let response = TransportResponse::new(202, "").with_header("X-Message-Id", "sg-1");
        assert_eq!(response.header_value("x-message-id"), Some("sg-1"));
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::timeout("request timed out");
        assert!(err.timed_out);
        assert_eq!(err.to_string(), "request timed out");
    }

    /// Accept one connection, answer `200 {}` and return the raw request.
    async fn capture_request(listener: TcpListener) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&raw).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = header_lines(&text[..end], "content-length")
                    .first()
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length {
                    break;
                }
            }
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}")
            .await
            .unwrap();
        String::from_utf8_lossy(&raw).into_owned()
    }

    /// Values of every header line named `name` in a raw request head.
    fn header_lines(head: &str, name: &str) -> Vec<String> {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .filter(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim().to_string())
            .collect()
    }

    async fn post_to_local(request: impl FnOnce(String) -> TransportRequest) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/emails", listener.local_addr().unwrap());
        let server = tokio::spawn(capture_request(listener));

        let response = ReqwestTransport::default()
            .post_json(request(url))
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        server.await.unwrap()
    }

    #[tokio::test]
    async fn test_json_post_carries_one_content_type() {
        let raw = post_to_local(|url| {
            TransportRequest::new(url, json!({"to": "a@example.com"}), Duration::from_secs(5))
                .header("Authorization", "Bearer re_123")
        })
        .await;

        assert_eq!(header_lines(&raw, "content-type"), vec!["application/json"]);
        assert_eq!(header_lines(&raw, "authorization"), vec!["Bearer re_123"]);
        assert!(raw.ends_with(r#"{"to":"a@example.com"}"#));
    }

    #[tokio::test]
    async fn test_caller_content_type_is_not_repeated() {
        let raw = post_to_local(|url| {
            TransportRequest::new(url, json!({}), Duration::from_secs(5))
                .header("Content-Type", "application/json")
        })
        .await;

        assert_eq!(header_lines(&raw, "content-type"), vec!["application/json"]);
    }

    #[tokio::test]
    async fn test_invalid_header_fails_before_sending() {
        let request = TransportRequest::new("http://127.0.0.1:9", json!({}), Duration::from_secs(1))
            .header("api-key", "line\nbreak");
        let err = ReqwestTransport::default().post_json(request).await.unwrap_err();
        assert!(!err.timed_out);
        assert!(err.message.contains("api-key"));
    }

    #[tokio::test]
    async fn test_silent_server_hits_request_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/emails", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let request = TransportRequest::new(url, json!({}), Duration::from_millis(200));
        let err = ReqwestTransport::default().post_json(request).await.unwrap_err();
        assert!(err.timed_out, "{}", err);
    }
}
