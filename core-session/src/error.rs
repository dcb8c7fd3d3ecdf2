use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport error: {0}")]
    Transport(#[from] BridgeError),

    #[error("Remote query failed with status {status}: {body}")]
    RemoteQuery { status: u16, body: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Failed to serialize request body: {0}")]
    Serialization(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl SessionError {
    /// HTTP status of a remote rejection, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::RemoteQuery { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
