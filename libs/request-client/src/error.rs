//! Error types for the request client

use remediar_models::{NormalizationError, Status};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Message used when an error body carries neither `message` nor `error`.
pub const UNKNOWN_REQUEST_ERROR: &str = "Erro desconhecido na requisição";

/// Message used when the request never got an answer.
pub const NO_RESPONSE: &str = "Sem resposta do servidor";

/// Failure of a single backend call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("{}", NO_RESPONSE)]
    NoResponse,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Build a status error from an error response body.
    pub fn from_body(status: u16, body: &serde_json::Value) -> Self {
        let message = ["message", "error"]
            .iter()
            .filter_map(|key| body.get(*key).and_then(serde_json::Value::as_str))
            .map(str::trim)
            .find(|m| !m.is_empty())
            .unwrap_or(UNKNOWN_REQUEST_ERROR)
            .to_string();
        Self::Status { status, message }
    }

    /// 401 and 403 end the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to fetch data: {0}")]
    Fetch(TransportError),

    #[error("Failed to {action} request {id}: {source}")]
    Transition {
        id: String,
        action: String,
        source: TransportError,
    },

    #[error("Not authenticated: {0}")]
    Auth(String),

    #[error("Invalid record: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Cannot {action} a request in status {status}")]
    InvalidTransition { action: String, status: Status },

    #[error("Request not found on the current page: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
