//! HTTP Client Abstraction
//!
//! Provides async HTTP execution over a pooled, reusable connection.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Construction options handed to an [`HttpClientFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound for both connecting and completing a single request.
    pub timeout: Duration,
    /// Maximum idle pooled connections kept per host.
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 10,
            user_agent: concat!("baas-access/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Async HTTP client trait
///
/// One instance wraps one connection pool and is shared by every in-flight
/// request. Implementations must not retry: a failed attempt is reported as-is
/// so the layer above decides what to do with it.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, HttpMethod};
///
/// async fn fetch_user(client: &dyn HttpClient) -> Result<serde_json::Value> {
///     let request = HttpRequest::new(HttpMethod::Get, "https://project.example.co/auth/v1/user")
///         .header("Authorization", "Bearer token");
///
///     let response = client.execute(request).await?;
///     response.json()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    ///
    /// A response with a 4xx/5xx status is *not* an error at this level.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Creates pooled [`HttpClient`] instances.
///
/// The session layer calls this lazily on first use and again after an explicit
/// close, so construction may allocate sockets and TLS state.
pub trait HttpClientFactory: Send + Sync {
    fn create(&self, options: &ClientOptions) -> Result<Arc<dyn HttpClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Get, "https://example.com")
            .header("User-Agent", "test")
            .body(Bytes::from_static(b"{}"))
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(request.body.as_deref(), Some(&b"{}"[..]));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_http_response_json_and_status() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(r#"{"email":"a@b.com"}"#),
        };
        assert!(response.is_success());
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["email"], "a@b.com");

        let response = HttpResponse {
            status: 422,
            headers: HashMap::new(),
            body: Bytes::from_static(b"<html>"),
        };
        assert!(!response.is_success());
        assert!(matches!(
            response.json::<serde_json::Value>(),
            Err(BridgeError::OperationFailed(_))
        ));
    }

    #[test]
    fn test_client_options_default_timeout() {
        let options = ClientOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert!(options.user_agent.starts_with("baas-access/"));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
    }
}
