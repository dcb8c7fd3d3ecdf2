//! # Core Configuration Module
//!
//! Provides configuration management for the BaaS access layer.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `BaasConfig`
//! instance holding everything the session and auth layers need to talk to the
//! remote backend. It enforces fail-fast validation so a malformed base URL or
//! a missing service key is reported at startup instead of on the first request.
//!
//! ## Required Settings
//!
//! - `base_url` - Root URL of the BaaS project (e.g. `https://project.supabase.co`)
//! - `service_key` - Key sent as `apikey` and as the default bearer credential
//!
//! ## Optional Settings (with defaults)
//!
//! - `oauth_provider` - Provider used for the authorize URL (default: `google`)
//! - `oauth_scopes` - Extra scopes appended to the authorize URL (default: none)
//! - `oauth_redirect_uri` - Callback handed to the provider
//! - `password_reset_redirect` - Link target embedded in recovery e-mails
//! - `log_level` - Minimum level for the tracing subscriber (default: `info`)
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::BaasConfig;
//!
//! let config = BaasConfig::builder()
//!     .base_url("https://project.supabase.co")
//!     .service_key("service-role-key")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.oauth_provider, "google");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::BaasConfig;
//!
//! // Missing service key is rejected
//! let config = BaasConfig::builder()
//!     .base_url("https://project.supabase.co")
//!     .build()
//!     .expect("Should fail - missing service key");
//! ```

use crate::error::{Error, Result};
use bridge_traits::LogLevel;
use std::time::Duration;
use url::Url;

/// Fixed connect/request bound applied to every remote call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_OAUTH_PROVIDER: &str = "google";
const DEFAULT_OAUTH_REDIRECT_URI: &str = "http://localhost:8000/api/v1/auth/callback/google";
const DEFAULT_PASSWORD_RESET_REDIRECT: &str = "http://localhost:3000/reset-password";

/// Configuration for the remote BaaS connection.
///
/// Use [`BaasConfigBuilder`] to construct instances.
#[derive(Clone, PartialEq, Eq)]
pub struct BaasConfig {
    /// Project root URL, without trailing slash
    pub base_url: String,

    /// Service credential sent with every request
    pub service_key: String,

    /// OAuth provider name used by the authorize URL
    pub oauth_provider: String,

    /// Optional scopes appended to the authorize URL
    pub oauth_scopes: Option<String>,

    /// Where the provider redirects after consent
    pub oauth_redirect_uri: String,

    /// Link target for password recovery e-mails
    pub password_reset_redirect: String,

    /// Minimum log level
    pub log_level: LogLevel,
}

impl std::fmt::Debug for BaasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaasConfig")
            .field("base_url", &self.base_url)
            .field("service_key", &"[REDACTED]")
            .field("oauth_provider", &self.oauth_provider)
            .field("oauth_scopes", &self.oauth_scopes)
            .field("oauth_redirect_uri", &self.oauth_redirect_uri)
            .field("password_reset_redirect", &self.password_reset_redirect)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl BaasConfig {
    /// Creates a new builder for constructing a `BaasConfig`.
    pub fn builder() -> BaasConfigBuilder {
        BaasConfigBuilder::default()
    }

    /// Loads configuration from the process environment.
    ///
    /// A `.env` file in the working directory (or any parent) is read first;
    /// variables already present in the environment take precedence.
    ///
    /// | Variable                    | Field                     |
    /// |-----------------------------|---------------------------|
    /// | `SUPABASE_URL`              | `base_url`                |
    /// | `SUPABASE_SERVICE_ROLE_KEY` | `service_key`             |
    /// | `SUPABASE_ANON_KEY`         | `service_key` (fallback)  |
    /// | `OAUTH_PROVIDER`            | `oauth_provider`          |
    /// | `OAUTH_SCOPES`              | `oauth_scopes`            |
    /// | `GOOGLE_REDIRECT_URI`       | `oauth_redirect_uri`      |
    /// | `PASSWORD_RESET_REDIRECT`   | `password_reset_redirect` |
    /// | `LOG_LEVEL`                 | `log_level`               |
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url =
            non_empty("SUPABASE_URL").ok_or_else(|| Error::MissingEnv("SUPABASE_URL".to_string()))?;
        let service_key = non_empty("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|| non_empty("SUPABASE_ANON_KEY"))
            .ok_or_else(|| {
                Error::MissingEnv("SUPABASE_SERVICE_ROLE_KEY or SUPABASE_ANON_KEY".to_string())
            })?;

        let mut builder = BaasConfig::builder()
            .base_url(base_url)
            .service_key(service_key);

        if let Some(provider) = non_empty("OAUTH_PROVIDER") {
            builder = builder.oauth_provider(provider);
        }
        if let Some(scopes) = non_empty("OAUTH_SCOPES") {
            builder = builder.oauth_scopes(scopes);
        }
        if let Some(uri) = non_empty("GOOGLE_REDIRECT_URI") {
            builder = builder.oauth_redirect_uri(uri);
        }
        if let Some(uri) = non_empty("PASSWORD_RESET_REDIRECT") {
            builder = builder.password_reset_redirect(uri);
        }
        if let Some(level) = non_empty("LOG_LEVEL") {
            let parsed = LogLevel::parse(&level)
                .ok_or_else(|| Error::Config(format!("Unknown LOG_LEVEL '{}'", level)))?;
            builder = builder.log_level(parsed);
        }

        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Base URL parses and uses `http` or `https`
    /// - Service key is not blank
    /// - OAuth provider is not blank
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if self.service_key.trim().is_empty() {
            return Err(Error::Config("Service key cannot be empty".to_string()));
        }

        if self.oauth_provider.trim().is_empty() {
            return Err(Error::Config("OAuth provider cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Builder for constructing [`BaasConfig`] instances.
#[derive(Default)]
pub struct BaasConfigBuilder {
    base_url: Option<String>,
    service_key: Option<String>,
    oauth_provider: Option<String>,
    oauth_scopes: Option<String>,
    oauth_redirect_uri: Option<String>,
    password_reset_redirect: Option<String>,
    log_level: Option<LogLevel>,
}

impl BaasConfigBuilder {
    /// Sets the project root URL. A trailing `/` is stripped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the service credential.
    pub fn service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    /// Sets the OAuth provider name.
    ///
    /// Default: `google`
    pub fn oauth_provider(mut self, provider: impl Into<String>) -> Self {
        self.oauth_provider = Some(provider.into());
        self
    }

    /// Sets scopes to request from the OAuth provider.
    pub fn oauth_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.oauth_scopes = Some(scopes.into());
        self
    }

    pub fn oauth_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.oauth_redirect_uri = Some(uri.into());
        self
    }

    pub fn password_reset_redirect(mut self, uri: impl Into<String>) -> Self {
        self.password_reset_redirect = Some(uri.into());
        self
    }

    /// Default: `LogLevel::Info`
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Builds the final `BaasConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or service key is missing or invalid.
    pub fn build(self) -> Result<BaasConfig> {
        let base_url = self.base_url.ok_or_else(|| {
            Error::Config("Base URL is required. Use .base_url() to set it.".to_string())
        })?;

        let service_key = self.service_key.ok_or_else(|| {
            Error::Config("Service key is required. Use .service_key() to set it.".to_string())
        })?;

        let config = BaasConfig {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            service_key,
            oauth_provider: self
                .oauth_provider
                .unwrap_or_else(|| DEFAULT_OAUTH_PROVIDER.to_string()),
            oauth_scopes: self.oauth_scopes,
            oauth_redirect_uri: self
                .oauth_redirect_uri
                .unwrap_or_else(|| DEFAULT_OAUTH_REDIRECT_URI.to_string()),
            password_reset_redirect: self
                .password_reset_redirect
                .unwrap_or_else(|| DEFAULT_PASSWORD_RESET_REDIRECT.to_string()),
            log_level: self.log_level.unwrap_or(LogLevel::Info),
        };

        config.validate()?;

        Ok(config)
    }
}
