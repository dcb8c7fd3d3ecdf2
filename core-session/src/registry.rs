use crate::error::Result;
use crate::query::QueryBuilder;
use crate::session::{HttpSession, SessionRequest};
use bridge_traits::HttpClientFactory;
use core_runtime::BaasConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Reachability of the BaaS project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub detail: String,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Owner of the process-wide [`HttpSession`].
///
/// Construct one at startup and hand it (or clones of [`session`](Self::session))
/// to the components that talk to the backend. Only the registry closes the
/// session.
#[derive(Debug)]
pub struct SessionRegistry {
    session: Arc<HttpSession>,
}

impl SessionRegistry {
    pub fn new(config: &BaasConfig, factory: Arc<dyn HttpClientFactory>) -> Result<Self> {
        Ok(Self::from_session(HttpSession::new(config, factory)?))
    }

    pub fn from_session(session: HttpSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    pub fn session(&self) -> Arc<HttpSession> {
        Arc::clone(&self.session)
    }

    /// Starts a fresh query against `name`.
    pub fn table(&self, name: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(self.session(), name)
    }

    /// Probes `GET /rest/v1/`. Any HTTP answer counts as reachable.
    #[instrument(skip(self))]
    pub async fn health(&self) -> HealthReport {
        match self.session.execute(SessionRequest::get("/rest/v1/")).await {
            Ok(response) => {
                info!(status = response.status, "Backend health probe answered");
                HealthReport {
                    status: HealthStatus::Healthy,
                    detail: "connected".to_string(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Backend health probe failed");
                HealthReport {
                    status: HealthStatus::Unhealthy,
                    detail: e.to_string(),
                }
            }
        }
    }

    pub async fn shutdown(&self) {
        self.session.close().await;
        info!("Session registry shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        response, session_with_client, test_config, MockClientFactory, MockHttpClient,
    };
    use bridge_traits::{BridgeError, HttpClient};

    #[tokio::test]
    async fn test_health_reports_connected_for_any_response() {
        let mut client = MockHttpClient::new();
        client.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, "https://project.supabase.co/rest/v1/");
            Ok(response(404, ""))
        });
        let registry = SessionRegistry::from_session(session_with_client(client));

        let report = registry.health().await;
        assert!(report.is_healthy());
        assert_eq!(report.detail, "connected");
    }

    #[tokio::test]
    async fn test_health_reports_transport_failure() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::ConnectionFailed("connection refused".to_string())));
        let registry = SessionRegistry::from_session(session_with_client(client));

        let report = registry.health().await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.detail.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_session_handles_share_one_connection() {
        let mut factory = MockClientFactory::new();
        factory
            .expect_create()
            .times(1)
            .returning(|_| Ok(std::sync::Arc::new(MockHttpClient::new()) as Arc<dyn HttpClient>));
        let registry = SessionRegistry::new(&test_config(), Arc::new(factory)).unwrap();

        let a = registry.session().acquire().await.unwrap();
        let b = registry.session().acquire().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_shutdown_closes_and_next_use_reconnects() {
        let registry = SessionRegistry::from_session(session_with_client(MockHttpClient::new()));
        let before = registry.session().acquire().await.unwrap();

        registry.shutdown().await;
        registry.shutdown().await;
        assert!(before.is_closed());
        assert!(!registry.session().is_open().await);

        let after = registry.session().acquire().await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_table_starts_fresh_builder() {
        let registry = SessionRegistry::from_session(session_with_client(MockHttpClient::new()));
        assert_eq!(registry.table("jobs").render_path(), "/rest/v1/jobs?select=*");
    }

    #[test]
    fn test_health_report_serializes_lowercase() {
        let report = HealthReport {
            status: HealthStatus::Healthy,
            detail: "connected".to_string(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
