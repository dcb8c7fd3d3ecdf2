//! # Host Bridge Traits
//!
//! Transport abstraction traits implemented by each host environment.
//!
//! ## Overview
//!
//! This crate defines the contract between the BaaS access layer and the
//! concrete networking stack. The core never talks to `reqwest` directly: it
//! asks an [`HttpClientFactory`](http::HttpClientFactory) for a pooled
//! [`HttpClient`](http::HttpClient) and executes [`HttpRequest`](http::HttpRequest)
//! values through it. That keeps the session, query and auth layers testable
//! with `mockall` doubles.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP execution against a pooled connection
//! - [`HttpClientFactory`](http::HttpClientFactory) - Constructs clients on first use
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to a host pipeline
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Implementations
//! should map timeouts and connect failures to the dedicated variants so callers can
//! tell transport failures apart from everything else.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one client can serve many in-flight
//! requests from different tasks.

pub mod error;
pub mod http;
pub mod log;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{ClientOptions, HttpClient, HttpClientFactory, HttpMethod, HttpRequest, HttpResponse};
pub use log::{LogEntry, LogLevel, LoggerSink};
