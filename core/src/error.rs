//! Error types for the helpdesk API client.
//!
//! # Design
//! Every failure a call can produce lands in one `ApiError`. The remote
//! service signals failure through a JSON body with a `description` field,
//! so application errors keep both that message and the parsed payload.
//! Bodies that are not JSON at all collapse into `Decode` with the fixed
//! message `"Not a JSON response from API"`. Transport failures are carried
//! through unmodified inside `TransportError`.

use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;

/// Message used whenever a response body is not valid JSON.
pub const NOT_JSON_MESSAGE: &str = "Not a JSON response from API";

/// Broad classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a readable HTTP response.
    Transport,
    /// A response arrived but its body could not be interpreted.
    Decode,
    /// The service answered with an error status and a JSON body.
    Application,
    /// The request could not be built.
    Request,
    /// The client was configured with invalid values.
    Config,
}

/// Errors returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The body was not JSON, or the JSON did not fit the expected record.
    #[error("{message}")]
    Decode {
        message: String,
        payload: Option<Value>,
    },

    /// A status other than 200, 201 or 204 with a JSON body.
    #[error("{message}")]
    Application {
        status: u16,
        message: String,
        payload: Value,
    },

    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn not_json() -> Self {
        ApiError::Decode {
            message: NOT_JSON_MESSAGE.to_string(),
            payload: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Decode { .. } => ErrorKind::Decode,
            ApiError::Application { .. } => ErrorKind::Application,
            ApiError::Serialization(_) => ErrorKind::Request,
            ApiError::Config(_) => ErrorKind::Config,
        }
    }

    /// Human-readable message; identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The JSON that produced the error, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ApiError::Decode { payload, .. } => payload.as_ref(),
            ApiError::Application { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// HTTP status for application errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A failure reported by a [`Transport`](crate::http::Transport).
///
/// Wraps the transport's own error without altering it. Use
/// [`downcast_ref`](TransportError::downcast_ref) to recover the concrete
/// type (for example `ureq::Error`).
#[derive(Debug)]
pub struct TransportError {
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl TransportError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            inner: error.into(),
        }
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.inner
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}
