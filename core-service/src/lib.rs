//! Core service façade and bootstrap helpers.
//!
//! This crate wires a host-provided HTTP client factory into the session,
//! table and auth layers. Desktop and server hosts typically enable the
//! `desktop-shims` feature (on by default), which pulls in the reqwest-backed
//! factory from `bridge-desktop` and adds [`bootstrap`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{HttpClientFactory, LoggerSink};
use core_auth::AuthService;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_runtime::BaasConfig;
use core_session::{HealthReport, QueryBuilder, SessionRegistry};
use tracing::{debug, info};

/// Bridge handles the core requires from its host.
#[derive(Clone)]
pub struct CoreDependencies {
    pub http_factory: Arc<dyn HttpClientFactory>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl CoreDependencies {
    pub fn new(http_factory: Arc<dyn HttpClientFactory>) -> Self {
        Self {
            http_factory,
            logger_sink: None,
        }
    }

    /// Mirror log events into a host pipeline when logging is initialized by [`init_host_logging`].
    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Reqwest-backed dependencies.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop() -> Self {
        Self::new(Arc::new(bridge_desktop::ReqwestClientFactory::new()))
    }
}

struct CoreInner {
    config: BaasConfig,
    registry: SessionRegistry,
    auth: AuthService,
}

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; every clone shares one session registry.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<CoreInner>,
}

impl CoreService {
    /// Wires the registry and auth service. No connection is opened yet.
    pub fn new(config: BaasConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let registry = SessionRegistry::new(&config, deps.http_factory)?;
        let auth = AuthService::from_config(registry.session(), &config);

        info!(base_url = %config.base_url, "Core service initialized");
        Ok(Self {
            inner: Arc::new(CoreInner {
                config,
                registry,
                auth,
            }),
        })
    }

    pub fn config(&self) -> &BaasConfig {
        &self.inner.config
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    /// Starts a query against `name`.
    pub fn table(&self, name: impl Into<String>) -> QueryBuilder {
        self.inner.registry.table(name)
    }

    pub async fn health(&self) -> HealthReport {
        self.inner.registry.health().await
    }

    /// Closes the shared connection. A later call reconnects transparently.
    pub async fn shutdown(&self) {
        self.inner.registry.shutdown().await;
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Installs the global tracing subscriber at the configured level.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_host_logging(config: &BaasConfig, deps: &CoreDependencies) -> bool {
    let mut logging = LoggingConfig::default().with_level(config.log_level);
    if let Some(sink) = deps.logger_sink.clone() {
        logging = logging.with_logger_sink(sink);
    }

    match init_logging(logging) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Logging already initialized");
            false
        }
    }
}

/// Convenience bootstrapper for desktop and server hosts.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::BaasConfig;
///
/// let core = core_service::bootstrap(BaasConfig::from_env()?)?;
/// let report = core.health().await;
/// println!("backend: {:?}", report.status);
/// core.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap(config: BaasConfig) -> Result<CoreService> {
    let deps = CoreDependencies::desktop();
    init_host_logging(&config, &deps);
    CoreService::new(config, deps)
}

/// [`bootstrap`] with configuration read from the environment and `.env`.
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_from_env() -> Result<CoreService> {
    bootstrap(BaasConfig::from_env()?)
}
