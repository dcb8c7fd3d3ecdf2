use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Session error: {0}")]
    Session(#[from] core_session::SessionError),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
