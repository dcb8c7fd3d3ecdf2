//! Normalization of provider payloads into [`UserProfile`] and [`TokenPair`].
//!
//! The auth endpoints answer in one of two shapes:
//!
//! ```text
//! Nested: { "user": { "id": .., "email": .., "user_metadata": {..} }, "access_token": .., .. }
//! Flat:   { "id": .., "email": .., "user_metadata": {..}, "access_token": .., .. }
//! ```
//!
//! [`UserShape::classify`] picks the user object; both shapes decode through
//! the same [`RemoteUser`] step and yield identical profiles.

use crate::error::{AuthError, Result};
use crate::types::{AuthResponse, TokenPair, UserProfile, UserType};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

/// Where the user object sits in a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserShape<'a> {
    /// `{ "user": { .. } }` envelope
    Nested(&'a Value),
    /// User fields at the top level
    Flat(&'a Value),
}

impl<'a> UserShape<'a> {
    pub fn classify(payload: &'a Value) -> Self {
        match payload.get("user") {
            Some(user @ Value::Object(_)) => UserShape::Nested(user),
            _ => UserShape::Flat(payload),
        }
    }

    pub fn user(&self) -> &'a Value {
        match self {
            UserShape::Nested(user) | UserShape::Flat(user) => user,
        }
    }
}

/// Typed intermediate of the provider's user object.
#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<Value>,
    email_confirmed_at: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

/// Decodes the user object of `payload`, whichever shape it has.
pub fn user_profile_from(payload: &Value) -> Result<UserProfile> {
    let shape = UserShape::classify(payload);
    let remote: RemoteUser = serde_json::from_value(shape.user().clone())
        .map_err(|e| AuthError::InvalidResponse(format!("malformed user object: {}", e)))?;

    let id = Uuid::parse_str(&remote.id)
        .map_err(|e| AuthError::InvalidResponse(format!("user id '{}': {}", remote.id, e)))?;
    let email = remote
        .email
        .ok_or_else(|| AuthError::InvalidResponse("user object has no email".to_string()))?;

    let metadata = remote.user_metadata.unwrap_or(Value::Null);
    let metadata_str = |key: &str| {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(UserProfile {
        user_type: user_type_from(&id, metadata.get("user_type")),
        full_name: metadata_str("full_name"),
        avatar_url: metadata_str("avatar_url"),
        email_confirmed_at: parse_timestamp("email_confirmed_at", remote.email_confirmed_at),
        created_at: parse_timestamp("created_at", remote.created_at),
        updated_at: parse_timestamp("updated_at", remote.updated_at),
        id,
        email,
    })
}

/// Reads tokens from the top level, or from a `session` object when present.
pub fn token_pair_from(payload: &Value) -> TokenPair {
    let source = match payload.get("session") {
        Some(session @ Value::Object(_)) => session,
        _ => payload,
    };
    let token = |key: &str| {
        source
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };

    TokenPair {
        access_token: token("access_token"),
        refresh_token: token("refresh_token"),
        expires_in: seconds_field(source, "expires_in").unwrap_or(TokenPair::DEFAULT_EXPIRES_IN),
        expires_at: seconds_field(source, "expires_at"),
        ..TokenPair::default()
    }
}

/// Integer seconds; fractional values are truncated, anything else is dropped.
fn seconds_field(source: &Value, key: &str) -> Option<i64> {
    let value = source.get(key)?;
    let seconds = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64));
    if seconds.is_none() && !value.is_null() {
        debug!(field = key, value = %value, "Ignoring non-numeric token field");
    }
    seconds
}

pub fn auth_response_from(payload: &Value) -> Result<AuthResponse> {
    Ok(AuthResponse {
        user: user_profile_from(payload)?,
        session: token_pair_from(payload),
    })
}

/// Missing or unrecognized values fall back to `Candidate`, loudly.
fn user_type_from(user_id: &Uuid, raw: Option<&Value>) -> UserType {
    match raw {
        Some(Value::String(name)) => match UserType::parse(name) {
            Some(user_type) => user_type,
            None => {
                warn!(
                    user_id = %user_id,
                    raw_user_type = %name,
                    "Unrecognized user_type in user metadata, defaulting to candidate"
                );
                UserType::Candidate
            }
        },
        Some(other) => {
            warn!(
                user_id = %user_id,
                raw_user_type = %other,
                "Non-string user_type in user metadata, defaulting to candidate"
            );
            UserType::Candidate
        }
        None => {
            warn!(
                user_id = %user_id,
                "No user_type in user metadata, defaulting to candidate"
            );
            UserType::Candidate
        }
    }
}

fn parse_timestamp(field: &str, raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            debug!(field, value = %raw, error = %e, "Ignoring unparseable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn user_object() -> Value {
        json!({
            "id": USER_ID,
            "email": "a@b.com",
            "user_metadata": {
                "full_name": "A B",
                "user_type": "organization",
                "avatar_url": "https://img/a.png"
            },
            "email_confirmed_at": "2024-05-01T10:00:00.123456Z",
            "created_at": "2024-05-01T09:59:00Z",
            "updated_at": null
        })
    }

    #[test]
    fn test_classify_nested_and_flat() {
        let nested = json!({"user": user_object(), "access_token": "at"});
        assert!(matches!(UserShape::classify(&nested), UserShape::Nested(_)));

        let flat = user_object();
        assert!(matches!(UserShape::classify(&flat), UserShape::Flat(_)));

        let null_user = json!({"user": null, "id": USER_ID});
        assert!(matches!(UserShape::classify(&null_user), UserShape::Flat(_)));
    }

    #[test]
    fn test_both_shapes_yield_identical_profiles() {
        let mut flat = user_object();
        flat["access_token"] = json!("at");
        let nested = json!({"user": user_object(), "access_token": "at"});

        let from_flat = user_profile_from(&flat).unwrap();
        let from_nested = user_profile_from(&nested).unwrap();

        assert_eq!(from_flat, from_nested);
        assert_eq!(
            serde_json::to_vec(&from_flat).unwrap(),
            serde_json::to_vec(&from_nested).unwrap()
        );
        assert_eq!(from_flat.user_type, UserType::Organization);
        assert_eq!(from_flat.full_name.as_deref(), Some("A B"));
        assert!(from_flat.is_email_confirmed());
        assert!(from_flat.updated_at.is_none());
    }

    #[test]
    fn test_missing_or_unknown_user_type_falls_back_to_candidate() {
        let mut missing = user_object();
        missing["user_metadata"] = json!({});
        assert_eq!(user_profile_from(&missing).unwrap().user_type, UserType::Candidate);

        let mut no_metadata = user_object();
        no_metadata.as_object_mut().unwrap().remove("user_metadata");
        assert_eq!(user_profile_from(&no_metadata).unwrap().user_type, UserType::Candidate);

        let mut unknown = user_object();
        unknown["user_metadata"]["user_type"] = json!("recruiter");
        assert_eq!(user_profile_from(&unknown).unwrap().user_type, UserType::Candidate);
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        let mut payload = user_object();
        payload["id"] = json!("not-a-uuid");
        assert!(matches!(
            user_profile_from(&payload),
            Err(AuthError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_missing_email_is_rejected() {
        let mut payload = user_object();
        payload.as_object_mut().unwrap().remove("email");
        assert!(user_profile_from(&payload).is_err());
    }

    #[test]
    fn test_bad_timestamp_is_dropped() {
        let mut payload = user_object();
        payload["created_at"] = json!("yesterday");
        assert!(user_profile_from(&payload).unwrap().created_at.is_none());
    }

    #[test]
    fn test_token_pair_defaults_when_absent() {
        let tokens = token_pair_from(&user_object());
        assert_eq!(tokens.access_token, "");
        assert_eq!(tokens.refresh_token, "");
        assert_eq!(tokens.expires_in, 3600);
        assert_eq!(tokens.token_type, "bearer");
    }

    #[test]
    fn test_token_pair_reads_session_object() {
        let payload = json!({
            "user": user_object(),
            "session": {
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 900,
                "expires_at": 1714557600
            }
        });
        let tokens = token_pair_from(&payload);
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.expires_in, 900);
        assert_eq!(tokens.expires_at, Some(1714557600));
    }

    #[test]
    fn test_odd_expiry_types_keep_tokens() {
        let payload = json!({
            "user": user_object(),
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": "soon",
            "expires_at": 1714557600.5
        });

        let response = auth_response_from(&payload).unwrap();
        assert_eq!(response.session.access_token, "at");
        assert_eq!(response.session.refresh_token, "rt");
        assert_eq!(response.session.expires_in, TokenPair::DEFAULT_EXPIRES_IN);
        assert_eq!(response.session.expires_at, Some(1714557600));
    }

    #[test]
    fn test_non_string_token_only_loses_that_field() {
        let payload = json!({"access_token": "at", "refresh_token": 42, "expires_in": 60});
        let tokens = token_pair_from(&payload);
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.refresh_token, "");
        assert_eq!(tokens.expires_in, 60);
    }
}
