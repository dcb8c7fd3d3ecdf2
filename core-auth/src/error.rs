use bridge_traits::BridgeError;
use core_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Auth request failed with status {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Auth transport error: {0}")]
    Transport(BridgeError),

    #[error("Session error: {0}")]
    Session(SessionError),

    #[error("Invalid auth response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl AuthError {
    /// HTTP status of a remote rejection, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401 and 403 answers from the auth endpoints.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Transport(inner) => AuthError::Transport(inner),
            other => AuthError::Session(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
