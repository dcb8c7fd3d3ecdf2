//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the BaaS access layer:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the session, auth and
//! service crates depend on. It establishes the configuration contract
//! (base URL, service key, OAuth settings) and the logging conventions used
//! throughout the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BaasConfig, BaasConfigBuilder, REQUEST_TIMEOUT};
pub use error::{Error, Result};
