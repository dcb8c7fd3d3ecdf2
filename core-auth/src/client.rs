//! # Auth Client
//!
//! Wire protocol of the BaaS auth endpoints (`/auth/v1/*`).
//!
//! Every call goes through the shared [`HttpSession`], so requests carry the
//! session's default headers. Calls made on behalf of a user replace only the
//! `Authorization` header with that user's access token.
//!
//! Successful calls return the raw JSON payload; typing happens in
//! [`AuthService`](crate::AuthService). Non-2xx answers become
//! [`AuthError::Remote`] with the most specific message the provider sent.

use crate::error::{AuthError, Result};
use bridge_traits::HttpResponse;
use core_runtime::logging::redact_if_sensitive;
use core_session::{HttpSession, SessionRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const AUTH_PREFIX: &str = "/auth/v1";

/// Picks the provider's error message: `error_description`, then `msg`, then
/// `message`, then the raw body text.
///
/// ```
/// use core_auth::client::extract_error_message;
///
/// let body = br#"{"msg": "Invalid login credentials", "message": "ignored"}"#;
/// assert_eq!(extract_error_message(body), "Invalid login credentials");
/// assert_eq!(extract_error_message(b"Bad Gateway"), "Bad Gateway");
/// ```
pub fn extract_error_message(body: &[u8]) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) {
        for key in ["error_description", "msg", "message"] {
            match fields.get(key) {
                Some(Value::String(message)) if !message.is_empty() => return message.clone(),
                Some(Value::Null) | None => {}
                Some(Value::String(_)) => {}
                Some(other) => return other.to_string(),
            }
        }
    }
    String::from_utf8_lossy(body).into_owned()
}

/// Client for the auth endpoints of one BaaS project.
#[derive(Debug, Clone)]
pub struct AuthClient {
    session: Arc<HttpSession>,
}

impl AuthClient {
    pub fn new(session: Arc<HttpSession>) -> Self {
        Self { session }
    }

    /// `POST /auth/v1/signup`
    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    pub async fn sign_up(&self, email: &str, password: &str, data: Option<Value>) -> Result<Value> {
        let mut body = json!({ "email": email, "password": password });
        if let Some(data) = data {
            body["data"] = data;
        }
        let request = SessionRequest::post(auth_path("/signup")).json(&body)?;
        self.send(request).await
    }

    /// `POST /auth/v1/token?grant_type=password`
    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Value> {
        let request = SessionRequest::post(auth_path("/token?grant_type=password"))
            .json(&json!({ "email": email, "password": password }))?;
        self.send(request).await
    }

    /// `POST /auth/v1/logout` as the user owning `access_token`.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let request = SessionRequest::post(auth_path("/logout")).bearer_token(access_token);
        self.send(request).await.map(|_| ())
    }

    /// `GET /auth/v1/user` as the user owning `access_token`.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<Value> {
        let request = SessionRequest::get(auth_path("/user")).bearer_token(access_token);
        self.send(request).await
    }

    /// `POST /auth/v1/token?grant_type=refresh_token`
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<Value> {
        let request = SessionRequest::post(auth_path("/token?grant_type=refresh_token"))
            .json(&json!({ "refresh_token": refresh_token }))?;
        self.send(request).await
    }

    /// `POST /auth/v1/recover`
    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    pub async fn recover_password(&self, email: &str, redirect_to: Option<&str>) -> Result<()> {
        let mut body = json!({ "email": email });
        if let Some(redirect_to) = redirect_to {
            body["redirect_to"] = json!(redirect_to);
        }
        let request = SessionRequest::post(auth_path("/recover")).json(&body)?;
        self.send(request).await.map(|_| ())
    }

    /// `PUT /auth/v1/user` as the user owning `access_token`.
    #[instrument(skip_all)]
    pub async fn update_user(&self, access_token: &str, changes: &Value) -> Result<Value> {
        let request = SessionRequest::put(auth_path("/user"))
            .bearer_token(access_token)
            .json(changes)?;
        self.send(request).await
    }

    /// `POST /auth/v1/token?grant_type=authorization_code`
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<Value> {
        let request = SessionRequest::post(auth_path("/token?grant_type=authorization_code"))
            .json(&json!({ "auth_code": code }))?;
        self.send(request).await
    }

    /// Authorize URL for an OAuth provider. No network call.
    ///
    /// Parameters are appended as given, without percent-encoding.
    pub fn build_authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        scopes: Option<&str>,
    ) -> String {
        let mut url = format!(
            "{}{}?provider={}&redirect_to={}",
            self.session.base_url(),
            auth_path("/authorize"),
            provider,
            redirect_to
        );
        if let Some(scopes) = scopes.filter(|s| !s.is_empty()) {
            url.push_str("&scopes=");
            url.push_str(&urlencoding::encode(scopes));
        }
        url
    }

    async fn send(&self, request: SessionRequest) -> Result<Value> {
        let path = request.path.clone();
        let response = self.session.execute(request).await?;
        into_payload(&path, response)
    }
}

fn auth_path(endpoint: &str) -> String {
    format!("{}{}", AUTH_PREFIX, endpoint)
}

fn into_payload(path: &str, response: HttpResponse) -> Result<Value> {
    if !response.is_success() {
        let message = extract_error_message(&response.body);
        warn!(path, status = response.status, message = %message, "Auth request rejected");
        return Err(AuthError::Remote {
            status: response.status,
            message,
        });
    }

    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    let payload = response
        .json::<Value>()
        .map_err(|e| AuthError::InvalidResponse(format!("{} returned invalid JSON: {}", path, e)))?;
    debug!(path, status = response.status, "Auth request succeeded");
    Ok(payload)
}
