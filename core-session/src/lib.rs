//! # Core Session
//!
//! Connection lifecycle and table access for the BaaS project.
//!
//! ## Overview
//!
//! - [`HttpSession`] owns one lazily created, pooled connection with fixed
//!   base URL and default headers (`apikey`, service bearer token, JSON content type).
//! - [`QueryBuilder`] renders chained filters into a single `/rest/v1/<table>` request.
//! - [`SessionRegistry`] owns the session for the whole process, hands out
//!   builders and answers health probes.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestClientFactory;
//! use core_runtime::BaasConfig;
//! use core_session::SessionRegistry;
//! use std::sync::Arc;
//!
//! let config = BaasConfig::from_env()?;
//! let registry = SessionRegistry::new(&config, Arc::new(ReqwestClientFactory::new()))?;
//!
//! let open_jobs = registry
//!     .table("jobs")
//!     .eq("status", "open")
//!     .order("created_at", true)
//!     .limit(20)
//!     .execute_read()
//!     .await?;
//!
//! registry.shutdown().await;
//! ```

pub mod error;
pub mod query;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SessionError};
pub use query::{Filter, FilterOp, QueryBuilder, TableResponse};
pub use registry::{HealthReport, HealthStatus, SessionRegistry};
pub use session::{Connection, HttpSession, SessionRequest};
