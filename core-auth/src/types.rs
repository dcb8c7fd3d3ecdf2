use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Minimum accepted password length for sign-up and password updates.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Role a user registered as.
///
/// # Examples
///
/// ```
/// use core_auth::UserType;
///
/// assert_eq!(UserType::parse("Organization"), Some(UserType::Organization));
/// assert_eq!(UserType::Candidate.as_str(), "candidate");
/// assert_eq!(UserType::parse("recruiter"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Organization,
    #[default]
    Candidate,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Organization => "organization",
            UserType::Candidate => "candidate",
            UserType::Admin => "admin",
        }
    }

    /// Parse a user type name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "organization" => Some(UserType::Organization),
            "candidate" => Some(UserType::Candidate),
            "admin" => Some(UserType::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub user_type: UserType,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn is_email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Access and refresh token bundle.
///
/// Tokens are opaque here: they are forwarded, never decoded or checked for
/// expiry.
///
/// # Security
///
/// The `Debug` implementation redacts both tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"bearer"`
    pub token_type: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    /// Expiry as Unix epoch seconds, when the provider reports it
    pub expires_at: Option<i64>,
}

impl TokenPair {
    pub const DEFAULT_EXPIRES_IN: i64 = 3600;

    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            ..Self::default()
        }
    }

    /// `false` when the provider returned no session, e.g. while e-mail
    /// confirmation is pending after sign-up.
    pub fn has_session(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl Default for TokenPair {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            refresh_token: String::new(),
            token_type: "bearer".to_string(),
            expires_in: Self::DEFAULT_EXPIRES_IN,
            expires_at: None,
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of every flow that establishes a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub session: TokenPair,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    pub full_name: Option<String>,
}

impl SignUpRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        user_type: UserType,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            user_type,
            full_name: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Checks the e-mail shape and password length before any network call.
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("user_type", &self.user_type)
            .field("full_name", &self.full_name)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl SignInRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

pub(crate) fn validate_email(email: &str) -> Result<()> {
    let valid = match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidRequest(format!(
            "'{}' is not a valid e-mail address",
            email
        )))
    }
}

pub(crate) fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_round_trip_names() {
        for user_type in [UserType::Organization, UserType::Candidate, UserType::Admin] {
            assert_eq!(UserType::parse(user_type.as_str()), Some(user_type));
        }
        assert_eq!(UserType::default(), UserType::Candidate);
    }

    #[test]
    fn test_user_type_serializes_lowercase() {
        let json = serde_json::to_string(&UserType::Organization).unwrap();
        assert_eq!(json, "\"organization\"");
    }

    #[test]
    fn test_token_pair_defaults() {
        let tokens = TokenPair::default();
        assert_eq!(tokens.token_type, "bearer");
        assert_eq!(tokens.expires_in, 3600);
        assert!(!tokens.has_session());
        assert!(TokenPair::new("at", "rt").has_session());
    }

    #[test]
    fn test_token_pair_debug_redacts() {
        let tokens = TokenPair::new("secret-access", "secret-refresh");
        let debug = format!("{:?}", tokens);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }

    #[test]
    fn test_sign_up_request_debug_redacts_password() {
        let request = SignUpRequest::new("a@b.com", "Passw0rd!", UserType::Candidate);
        assert!(!format!("{:?}", request).contains("Passw0rd!"));
    }

    #[test]
    fn test_sign_up_validation() {
        let ok = SignUpRequest::new("a@b.com", "Passw0rd!", UserType::Candidate);
        assert!(ok.validate().is_ok());

        let short = SignUpRequest::new("a@b.com", "short", UserType::Candidate);
        assert!(matches!(short.validate(), Err(AuthError::InvalidRequest(_))));

        for email in ["", "plain", "@b.com", "a@", "a@b@c"] {
            let request = SignUpRequest::new(email, "Passw0rd!", UserType::Admin);
            assert!(request.validate().is_err(), "accepted {email:?}");
        }
    }
}
