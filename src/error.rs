// src/error.rs
use serde::Deserialize;
use thiserror::Error;

use crate::powerdns::cache::CacheError;
use crate::validation::ValidationError;

pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by the PowerDNS API on failures.
#[derive(Debug, Deserialize)]
pub struct ErrorResponseBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{context} (HTTP {status}): {message}")]
    Api {
        status: u16,
        context: String,
        message: String,
    },

    #[error("unknown ID format: '{0}'")]
    InvalidId(String),

    #[error(
        "the cache for REST API requests is enabled but the size isn't enough: \
         cache size {capacity}b, entry needs {required}b"
    )]
    CacheCapacity { capacity: usize, required: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Error::InvalidAddress(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Build an API error from a response body, preferring the server's own explanation.
    ///
    /// `context` names the operation ("error creating zone example.com."), `target` is
    /// used for the generic message when the body is not a PowerDNS error document.
    pub fn api(status: u16, context: impl Into<String>, target: &str, body: &[u8]) -> Self {
        let message = match serde_json::from_slice::<ErrorResponseBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => format!("operation failed for {target}"),
        };
        Error::Api {
            status,
            context: context.into(),
            message,
        }
    }

    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<CacheError> for Error {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Capacity { capacity, required } => {
                Error::CacheCapacity { capacity, required }
            }
        }
    }
}
