//! # HTTP Session
//!
//! One lazily created, pooled connection to the BaaS project, shared by every
//! in-flight request.
//!
//! ## Lifecycle
//!
//! ```text
//! Empty --acquire()--> Open(conn #1) --close()--> Empty --acquire()--> Open(conn #2)
//! ```
//!
//! - The first [`HttpSession::acquire`] asks the [`HttpClientFactory`] for a client
//!   and publishes it as a [`Connection`]. Concurrent first callers all receive the
//!   same connection; the factory runs once.
//! - [`HttpSession::close`] marks the published connection closed and empties the
//!   slot. Handles obtained earlier refuse further requests with
//!   [`BridgeError::ConnectionClosed`]; the next `acquire` builds a new connection.
//!
//! Base URL and default headers are fixed at construction and never mutated.

use crate::error::{Result, SessionError};
use bridge_traits::{
    BridgeError, ClientOptions, HttpClient, HttpClientFactory, HttpMethod, HttpRequest,
    HttpResponse,
};
use bytes::Bytes;
use core_runtime::{BaasConfig, REQUEST_TIMEOUT};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use url::Url;

/// A request relative to the session's base URL.
///
/// Headers set here override the session defaults of the same name.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub method: HttpMethod,
    /// Path plus optional query string, starting with `/`
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

impl SessionRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the service credential with a caller-held access token.
    pub fn bearer_token(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }
}

/// A published, pooled connection.
pub struct Connection {
    id: u64,
    base_url: Arc<str>,
    default_headers: Arc<HashMap<String, String>>,
    client: Arc<dyn HttpClient>,
    closed: AtomicBool,
}

impl Connection {
    /// Sequence number of this connection within its session, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Sends `request`, merging the session defaults underneath its headers.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::ConnectionClosed`] if the session closed this connection
    /// - Any transport failure reported by the underlying client
    ///
    /// A non-2xx status is returned as a normal response.
    pub async fn send(&self, request: SessionRequest) -> Result<HttpResponse> {
        if self.is_closed() {
            return Err(SessionError::Transport(BridgeError::ConnectionClosed));
        }

        let url = format!("{}{}", self.base_url, request.path);
        let mut http = HttpRequest::new(request.method, url).timeout(REQUEST_TIMEOUT);

        for (key, value) in self.default_headers.iter() {
            let overridden = request
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case(key));
            if !overridden {
                http = http.header(key.clone(), value.clone());
            }
        }
        for (key, value) in request.headers {
            http = http.header(key, value);
        }
        if let Some(body) = request.body {
            http = http.body(body);
        }

        debug!(
            connection = self.id,
            method = request.method.as_str(),
            path = %request.path,
            "Sending session request"
        );

        Ok(self.client.execute(http).await?)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Lazily connected HTTP session bound to one BaaS project.
pub struct HttpSession {
    base_url: Arc<str>,
    default_headers: Arc<HashMap<String, String>>,
    factory: Arc<dyn HttpClientFactory>,
    options: ClientOptions,
    slot: RwLock<Option<Arc<Connection>>>,
    created: AtomicU64,
}

impl HttpSession {
    /// Creates a session without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] when the base URL does not parse
    /// or is not `http`/`https`, or when the service key is blank.
    pub fn new(config: &BaasConfig, factory: Arc<dyn HttpClientFactory>) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(base_url).map_err(|e| {
            SessionError::InvalidConfig(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SessionError::InvalidConfig(format!(
                "Unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }
        if config.service_key.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "Service key cannot be empty".to_string(),
            ));
        }

        let mut default_headers = HashMap::new();
        default_headers.insert("apikey".to_string(), config.service_key.clone());
        default_headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", config.service_key),
        );
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(Self {
            base_url: Arc::from(base_url),
            default_headers: Arc::new(default_headers),
            factory,
            options: ClientOptions {
                timeout: REQUEST_TIMEOUT,
                ..ClientOptions::default()
            },
            slot: RwLock::new(None),
            created: AtomicU64::new(0),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the live connection, creating it on first use or after `close()`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the factory cannot build a client.
    pub async fn acquire(&self) -> Result<Arc<Connection>> {
        {
            let slot = self.slot.read().await;
            if let Some(conn) = slot.as_ref() {
                return Ok(Arc::clone(conn));
            }
        }

        let mut slot = self.slot.write().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(Arc::clone(conn));
        }

        let client = self.factory.create(&self.options)?;
        let id = self.created.fetch_add(1, Ordering::AcqRel) + 1;
        let conn = Arc::new(Connection {
            id,
            base_url: Arc::clone(&self.base_url),
            default_headers: Arc::clone(&self.default_headers),
            client,
            closed: AtomicBool::new(false),
        });
        *slot = Some(Arc::clone(&conn));

        info!(connection = id, base_url = %self.base_url, "HTTP session connected");
        Ok(conn)
    }

    /// Releases the current connection. Closing an already closed session is a no-op.
    pub async fn close(&self) {
        let mut slot = self.slot.write().await;
        if let Some(conn) = slot.take() {
            conn.mark_closed();
            info!(connection = conn.id(), "HTTP session closed");
        }
    }

    pub async fn is_open(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// Number of connections created over the session's lifetime.
    pub fn connections_created(&self) -> u64 {
        self.created.load(Ordering::Acquire)
    }

    /// Acquires the connection and sends `request` through it.
    #[instrument(
        skip(self, request),
        fields(method = request.method.as_str(), path = %request.path)
    )]
    pub async fn execute(&self, request: SessionRequest) -> Result<HttpResponse> {
        let conn = self.acquire().await?;
        conn.send(request).await
    }
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("base_url", &self.base_url)
            .field("connections_created", &self.connections_created())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        ok_response, session_with_client, test_config, MockClientFactory, MockHttpClient,
    };

    #[test]
    fn test_new_strips_trailing_slash_and_sets_defaults() {
        let config = BaasConfig::builder()
            .base_url("https://project.supabase.co/")
            .service_key("service-key")
            .build()
            .unwrap();
        let session = HttpSession::new(&config, Arc::new(MockClientFactory::new())).unwrap();

        assert_eq!(session.base_url(), "https://project.supabase.co");
        let headers = session.default_headers();
        assert_eq!(headers.get("apikey"), Some(&"service-key".to_string()));
        assert_eq!(
            headers.get("Authorization"),
            Some(&"Bearer service-key".to_string())
        );
        assert_eq!(
            headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let mut config = test_config();
        config.base_url = "ftp://project.supabase.co".to_string();
        let result = HttpSession::new(&config, Arc::new(MockClientFactory::new()));
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));

        config.base_url = "::not a url::".to_string();
        let result = HttpSession::new(&config, Arc::new(MockClientFactory::new()));
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_does_not_connect() {
        let mut factory = MockClientFactory::new();
        factory.expect_create().times(0);
        let session = HttpSession::new(&test_config(), Arc::new(factory)).unwrap();
        assert_eq!(session.connections_created(), 0);
    }

    #[tokio::test]
    async fn test_acquire_reuses_connection_until_closed() {
        let mut factory = MockClientFactory::new();
        factory.expect_create().times(2).returning(|options| {
            assert_eq!(options.timeout, REQUEST_TIMEOUT);
            Ok(Arc::new(MockHttpClient::new()) as Arc<dyn HttpClient>)
        });
        let session = HttpSession::new(&test_config(), Arc::new(factory)).unwrap();

        let first = session.acquire().await.unwrap();
        let again = session.acquire().await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert!(session.is_open().await);

        session.close().await;
        assert!(!session.is_open().await);
        assert!(first.is_closed());

        let second = session.acquire().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.id(), 2);
        assert!(!second.is_closed());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let session = session_with_client(MockHttpClient::new());
        session.close().await;
        session.close().await;

        session.acquire().await.unwrap();
        session.close().await;
        session.close().await;
        assert!(!session.is_open().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_acquire_creates_one_connection() {
        let mut factory = MockClientFactory::new();
        factory
            .expect_create()
            .times(1)
            .returning(|_| Ok(Arc::new(MockHttpClient::new()) as Arc<dyn HttpClient>));
        let session = Arc::new(HttpSession::new(&test_config(), Arc::new(factory)).unwrap());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.acquire().await.unwrap() })
            })
            .collect();

        let mut connections = Vec::new();
        for handle in handles {
            connections.push(handle.await.unwrap());
        }

        assert!(connections
            .windows(2)
            .all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(session.connections_created(), 1);
    }

    #[tokio::test]
    async fn test_factory_failure_surfaces_immediately() {
        let mut factory = MockClientFactory::new();
        factory
            .expect_create()
            .times(1)
            .returning(|_| Err(BridgeError::NotAvailable("no TLS backend".to_string())));
        let session = HttpSession::new(&test_config(), Arc::new(factory)).unwrap();

        let result = session.acquire().await;
        assert!(matches!(
            result,
            Err(SessionError::Transport(BridgeError::NotAvailable(_)))
        ));
        assert!(!session.is_open().await);
    }

    #[tokio::test]
    async fn test_send_merges_headers_with_override_winning() {
        let mut client = MockHttpClient::new();
        client.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, "https://project.supabase.co/auth/v1/user");
            assert_eq!(req.timeout, Some(REQUEST_TIMEOUT));
            assert_eq!(
                req.headers.get("Authorization"),
                Some(&"Bearer user-token".to_string())
            );
            assert_eq!(req.headers.get("apikey"), Some(&"service-key".to_string()));
            Ok(ok_response("{}"))
        });
        let session = session_with_client(client);

        let response = session
            .execute(SessionRequest::get("/auth/v1/user").bearer_token("user-token"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_lowercase_override_replaces_default() {
        let mut client = MockHttpClient::new();
        client.expect_execute().times(1).returning(|req| {
            assert_eq!(
                req.headers.get("authorization"),
                Some(&"Bearer other".to_string())
            );
            assert!(req.headers.get("Authorization").is_none());
            Ok(ok_response("[]"))
        });
        let session = session_with_client(client);

        session
            .execute(SessionRequest::get("/rest/v1/").header("authorization", "Bearer other"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stale_connection_rejects_requests_after_close() {
        let mut client = MockHttpClient::new();
        client.expect_execute().times(0);
        let session = session_with_client(client);

        let conn = session.acquire().await.unwrap();
        session.close().await;

        let result = conn.send(SessionRequest::get("/rest/v1/")).await;
        assert!(matches!(
            result,
            Err(SessionError::Transport(BridgeError::ConnectionClosed))
        ));
    }

    #[test]
    fn test_session_request_json_body() {
        let request = SessionRequest::post("/auth/v1/signup")
            .json(&serde_json::json!({"email": "a@b.com"}))
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body["email"], "a@b.com");
    }
}
