//! Error handling for the application

use thiserror::Error;

/// The single error kind raised by every client call.
///
/// Wraps network, validation and contract failures alike. `status` is only
/// set when the failure came from an HTTP response.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Wrap a transport failure the way every HTTP call reports it.
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::new(format!("Network error: {}", err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::network(err)
    }
}
