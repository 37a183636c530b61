//! Basic authentication credential.
//!
//! The service authenticates API keys as the username of HTTP Basic auth
//! with a fixed password of `X`. The header value is computed once and then
//! shared read-only by every request.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::ApiError;

/// Precomputed `Authorization` header value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    header: String,
}

impl Credential {
    /// Derive the credential from an API key.
    ///
    /// The key is encoded exactly as given. Returns `ApiError::Config` when
    /// it is empty or carries leading or trailing whitespace.
    pub fn from_api_key(api_key: &str) -> Result<Self, ApiError> {
        if api_key.is_empty() {
            return Err(ApiError::Config("api key is empty".to_string()));
        }
        if api_key.trim() != api_key {
            return Err(ApiError::Config(
                "api key has leading or trailing whitespace".to_string(),
            ));
        }
        let encoded = STANDARD.encode(format!("{api_key}:X"));
        Ok(Self {
            header: format!("Basic {encoded}"),
        })
    }

    /// The full header value, `Basic <base64(key:X)>`.
    pub fn header_value(&self) -> &str {
        &self.header
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(Basic ***)")
    }
}
