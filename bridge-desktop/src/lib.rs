//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for server and desktop hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides the production transport for the access layer:
//! - `HttpClient` using a pooled `reqwest::Client`
//! - `HttpClientFactory` that builds those clients with the session's
//!   timeout and pool settings
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestClientFactory;
//! use bridge_traits::{ClientOptions, HttpClientFactory};
//!
//! let factory = ReqwestClientFactory::new();
//! let client = factory.create(&ClientOptions::default())?;
//! ```

mod http;

pub use http::{ReqwestClientFactory, ReqwestHttpClient};
