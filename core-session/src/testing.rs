//! Shared mock doubles for unit tests.

use crate::session::HttpSession;
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{ClientOptions, HttpClient, HttpClientFactory, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_runtime::BaasConfig;
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;

mock! {
    pub HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

mock! {
    pub ClientFactory {}

    impl HttpClientFactory for ClientFactory {
        fn create(&self, options: &ClientOptions) -> BridgeResult<Arc<dyn HttpClient>>;
    }
}

pub fn test_config() -> BaasConfig {
    BaasConfig::builder()
        .base_url("https://project.supabase.co")
        .service_key("service-key")
        .build()
        .unwrap()
}

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

pub fn ok_response(body: &str) -> HttpResponse {
    response(200, body)
}

/// Session whose factory hands out `client` on every acquire.
pub fn session_with_client(client: MockHttpClient) -> HttpSession {
    let client: Arc<dyn HttpClient> = Arc::new(client);
    let mut factory = MockClientFactory::new();
    factory
        .expect_create()
        .returning(move |_| Ok(Arc::clone(&client)));
    HttpSession::new(&test_config(), Arc::new(factory)).unwrap()
}
