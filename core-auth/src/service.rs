//! # Auth Service
//!
//! Domain-facing façade over [`AuthClient`].
//!
//! ## Session state
//!
//! ```text
//! Anonymous --sign_up | sign_in | handle_oauth_callback--> Authenticated
//! Authenticated --refresh--> Authenticated'
//! Authenticated --sign_out--> Anonymous
//! ```
//!
//! Tokens are never checked for expiry locally. Each authenticated call is
//! attempted against the backend, and only an explicit rejection from it means
//! the caller is anonymous.
//!
//! ## Failure policy
//!
//! - Session-establishing flows and `refresh` propagate typed [`AuthError`]s.
//! - `get_current_user` turns every failure into `None`.
//! - `reset_password`, `update_password` and `sign_out` report a plain `bool`.

use crate::client::AuthClient;
use crate::error::{AuthError, Result};
use crate::password;
use crate::payload::{auth_response_from, token_pair_from, user_profile_from};
use crate::types::{
    validate_password, AuthResponse, SignInRequest, SignUpRequest, TokenPair, UserProfile,
    UserType,
};
use core_runtime::logging::redact_if_sensitive;
use core_runtime::BaasConfig;
use core_session::HttpSession;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Provider settings used to build the authorize URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSettings {
    pub provider: String,
    pub scopes: Option<String>,
    /// Used when the caller passes a blank redirect.
    pub redirect_uri: Option<String>,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            scopes: None,
            redirect_uri: None,
        }
    }
}

impl OAuthSettings {
    pub fn from_config(config: &BaasConfig) -> Self {
        Self {
            provider: config.oauth_provider.clone(),
            scopes: config.oauth_scopes.clone(),
            redirect_uri: Some(config.oauth_redirect_uri.clone()),
        }
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header value.
///
/// ```
/// use core_auth::extract_bearer_token;
///
/// assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
/// assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
/// assert_eq!(extract_bearer_token("Basic abc"), None);
/// assert_eq!(extract_bearer_token("Bearer "), None);
/// ```
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub struct AuthService {
    client: AuthClient,
    oauth: OAuthSettings,
    password_reset_redirect: Option<String>,
}

impl AuthService {
    pub fn new(client: AuthClient, oauth: OAuthSettings) -> Self {
        Self {
            client,
            oauth,
            password_reset_redirect: None,
        }
    }

    /// Service wired to `session` with provider and redirect settings from `config`.
    pub fn from_config(session: Arc<HttpSession>, config: &BaasConfig) -> Self {
        Self {
            client: AuthClient::new(session),
            oauth: OAuthSettings::from_config(config),
            password_reset_redirect: Some(config.password_reset_redirect.clone()),
        }
    }

    pub fn with_password_reset_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.password_reset_redirect = Some(redirect.into());
        self
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub fn oauth_settings(&self) -> &OAuthSettings {
        &self.oauth
    }

    /// Registers a new account with `full_name` and `user_type` as user metadata.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidRequest`] if the e-mail or password fails validation
    /// - [`AuthError::Remote`] if the backend rejects the sign-up
    /// - [`AuthError::InvalidResponse`] if the answer has no usable user object
    #[instrument(skip_all, fields(user_type = %request.user_type))]
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse> {
        request.validate()?;

        let data = json!({
            "full_name": request.full_name,
            "user_type": request.user_type.as_str(),
        });
        let payload = self
            .client
            .sign_up(&request.email, &request.password, Some(data))
            .await?;
        let response = auth_response_from(&payload)?;

        info!(
            email = %redact_if_sensitive("email", &request.email),
            user_type = %request.user_type,
            confirmed = response.session.has_session(),
            "User signed up"
        );
        Ok(response)
    }

    #[instrument(skip_all)]
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse> {
        let payload = self.client.sign_in(&request.email, &request.password).await?;
        let response = auth_response_from(&payload)?;

        info!(
            email = %redact_if_sensitive("email", &request.email),
            "User signed in"
        );
        Ok(response)
    }

    /// Exchanges the OAuth callback `code` for a session.
    #[instrument(skip_all)]
    pub async fn handle_oauth_callback(&self, code: &str) -> Result<AuthResponse> {
        if code.trim().is_empty() {
            return Err(AuthError::InvalidRequest(
                "authorization code is empty".to_string(),
            ));
        }

        let payload = self.client.exchange_code(code).await?;
        let response = auth_response_from(&payload)?;

        info!(provider = %self.oauth.provider, "OAuth sign-in completed");
        Ok(response)
    }

    /// Trades a refresh token for a new pair. The old refresh token is kept
    /// when the backend does not rotate it.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let payload = self.client.refresh(refresh_token).await?;
        let mut tokens = token_pair_from(&payload);

        if tokens.access_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "refresh response has no access token".to_string(),
            ));
        }
        if tokens.refresh_token.is_empty() {
            tokens.refresh_token = refresh_token.to_string();
        }

        info!(expires_in = tokens.expires_in, "Token refreshed");
        Ok(tokens)
    }

    /// Resolves the user behind `access_token`; `None` on any failure.
    #[instrument(skip_all)]
    pub async fn get_current_user(&self, access_token: &str) -> Option<UserProfile> {
        match self.resolve_user(access_token).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                debug!(error = %e, "No authenticated user");
                None
            }
        }
    }

    async fn resolve_user(&self, access_token: &str) -> Result<UserProfile> {
        if access_token.trim().is_empty() {
            return Err(AuthError::NotAuthenticated);
        }
        let payload = self.client.get_user(access_token).await?;
        user_profile_from(&payload)
    }

    /// Authorize URL for the configured provider. No network call.
    ///
    /// A blank `redirect_url` falls back to the configured callback.
    pub fn get_oauth_authorize_url(&self, user_type: UserType, redirect_url: &str) -> String {
        let redirect = match self.oauth.redirect_uri.as_deref() {
            Some(configured) if redirect_url.trim().is_empty() => configured,
            _ => redirect_url,
        };
        let url = self.client.build_authorize_url(
            &self.oauth.provider,
            redirect,
            self.oauth.scopes.as_deref(),
        );
        info!(
            provider = %self.oauth.provider,
            user_type = %user_type,
            "OAuth authorize URL generated"
        );
        url
    }

    /// Sends a recovery e-mail. `redirect_url` falls back to the configured
    /// reset page.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, email: &str, redirect_url: Option<&str>) -> bool {
        let redirect = redirect_url.or(self.password_reset_redirect.as_deref());
        match self.client.recover_password(email, redirect).await {
            Ok(()) => {
                info!(
                    email = %redact_if_sensitive("email", email),
                    "Password reset e-mail sent"
                );
                true
            }
            Err(e) => {
                warn!(error = %e, "Password reset request failed");
                false
            }
        }
    }

    /// Sets a new password for the user owning `access_token`.
    #[instrument(skip_all)]
    pub async fn update_password(&self, access_token: &str, new_password: &str) -> bool {
        if let Err(e) = validate_password(new_password) {
            warn!(error = %e, "Rejected password update");
            return false;
        }

        match self
            .client
            .update_user(access_token, &json!({ "password": new_password }))
            .await
        {
            Ok(_) => {
                info!("Password updated");
                true
            }
            Err(e) => {
                warn!(error = %e, "Password update failed");
                false
            }
        }
    }

    /// Revokes the session. Remote failures leave no local state behind, so
    /// they only flip the result to `false`.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> bool {
        match self.client.sign_out(access_token).await {
            Ok(()) => {
                info!("User signed out");
                true
            }
            Err(e) => {
                warn!(error = %e, "Sign-out failed");
                false
            }
        }
    }

    pub fn hash_password(&self, plain: &str) -> Result<String> {
        password::hash_password(plain)
    }

    pub fn verify_password(&self, plain: &str, digest: &str) -> bool {
        password::verify_password(plain, digest)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("oauth", &self.oauth)
            .field("password_reset_redirect", &self.password_reset_redirect)
            .finish_non_exhaustive()
    }
}
