//! Error types for the Shelf client.

use serde_json::Value;
use thiserror::Error;

/// Fallback message when neither the server nor the status line says anything.
pub(crate) const GENERIC_FAILURE: &str = "Network or server error";

/// Errors that can occur when talking to the library backend.
///
/// Presentation code usually only needs the `{http_status, message, data}`
/// triple exposed by [`ClientError::http_status`], [`ClientError::message`]
/// and [`ClientError::data`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be sent or the response could not be received
    #[error("{0}")]
    Network(String),

    /// The request exceeded its deadline
    #[error("Request timeout")]
    Timeout,

    /// Server answered with a non-2xx status
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        data: Option<Value>,
    },

    /// An operation needs a logged-in user but the session has no user id
    #[error("User not logged in")]
    NotLoggedIn,

    /// The backend does not advertise this optional endpoint
    #[error("Backend capability not available: {0}")]
    Unsupported(&'static str),

    /// Response data did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The HTTP client itself could not be set up
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// The session store failed to read or write
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub(crate) fn http(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            data,
        }
    }

    /// HTTP status of the failure; `0` when no response was received.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            _ => 0,
        }
    }

    /// Human-readable message, stable enough for callers to match on.
    pub fn message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Raw payload returned by the server alongside an error status.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Http { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    /// True when the request ran past its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// True for failures where the backend was never heard from.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }

    /// True for a 401 that survived the refresh attempt.
    pub fn is_unauthorized(&self) -> bool {
        self.http_status() == 401
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
