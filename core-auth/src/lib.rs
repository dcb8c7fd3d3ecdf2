//! # Authentication Module
//!
//! Sign-up, sign-in, OAuth and token lifecycle against the BaaS auth endpoints.
//!
//! ## Overview
//!
//! - [`AuthClient`] speaks the `/auth/v1/*` wire protocol and returns raw JSON.
//! - [`AuthService`] normalizes those payloads into [`AuthResponse`],
//!   [`UserProfile`] and [`TokenPair`], and decides which failures are fatal.
//! - [`password`] hashes locally managed credentials with Argon2id.
//!
//! Both client and service hold a shared handle to the registry's
//! [`HttpSession`](core_session::HttpSession) and never close it.

pub mod client;
pub mod error;
pub mod password;
pub mod payload;
pub mod service;
pub mod types;

pub use client::{extract_error_message, AuthClient};
pub use error::{AuthError, Result};
pub use payload::UserShape;
pub use service::{extract_bearer_token, AuthService, OAuthSettings};
pub use types::{
    AuthResponse, SignInRequest, SignUpRequest, TokenPair, UserProfile, UserType,
    MIN_PASSWORD_LENGTH,
};
