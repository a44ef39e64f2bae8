//! Error taxonomy for every operation that talks to the backend.
//!
//! - `Validation`: caught locally, no request was sent
//! - `Auth`: the session is gone or was rejected; the session store drops to anonymous
//! - `NotFound`: the referenced resource does not exist
//! - `Server` / `Transport`: anything else; prior state stays as it was

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server returned {status}: {detail}")]
    Server { status: u16, detail: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Token store error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }

    /// Classify an HTTP error status. 401 ends the session; 403 is a
    /// permission denial on one resource and does not.
    pub fn from_status(status: u16, detail: Option<String>, path: &str) -> Self {
        let detail = detail.unwrap_or_else(|| path.to_string());
        match status {
            401 => ClientError::Auth(detail),
            404 => ClientError::NotFound(detail),
            _ => ClientError::Server { status, detail },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<rusqlite::Error> for ClientError {
    fn from(err: rusqlite::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
