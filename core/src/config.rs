//! Per-instance client configuration.

use crate::auth::Credential;
use crate::error::ApiError;

/// Environment variable holding the service base URL.
pub const BASE_URL_ENV: &str = "HELPDESK_BASE_URL";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "HELPDESK_API_KEY";

/// Base URL and credential owned by one client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    credential: Credential,
}

impl ClientConfig {
    /// Validate `base_url` and derive the credential from `api_key`.
    ///
    /// The URL must be absolute `http` or `https`; a trailing `/` is dropped
    /// so paths can be appended directly. The key is used verbatim and is
    /// rejected if it has surrounding whitespace.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(base_url.trim())
            .map_err(|e| ApiError::Config(format!("invalid base url {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "unsupported url scheme {:?}",
                parsed.scheme()
            )));
        }
        if parsed.query().is_some() {
            return Err(ApiError::Config("base url must not carry a query string".to_string()));
        }
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            credential: Credential::from_api_key(api_key)?,
        })
    }

    /// Read `HELPDESK_BASE_URL` and `HELPDESK_API_KEY`.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = read_env(BASE_URL_ENV)?;
        let api_key = read_env(API_KEY_ENV)?;
        Self::new(&base_url, &api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

fn read_env(name: &str) -> Result<String, ApiError> {
    std::env::var(name).map_err(|_| ApiError::Config(format!("{name} is not set")))
}
