//! Request builder shared by every façade operation.

use serde::Serialize;

use crate::auth::Credential;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::query::Query;

/// Build a complete request description.
///
/// `content-type: application/json` and `authorization` are always set.
/// When `body` is present it is serialized to JSON text; otherwise the
/// request carries no body.
pub fn build_request<B>(
    method: HttpMethod,
    credential: &Credential,
    url: String,
    query: Option<&Query>,
    body: Option<&B>,
) -> Result<HttpRequest, ApiError>
where
    B: Serialize + ?Sized,
{
    let body = body
        .map(serde_json::to_string)
        .transpose()
        .map_err(ApiError::Serialization)?;
    Ok(assemble(method, credential, url, query, body))
}

/// `build_request` for operations that never carry a body.
pub(crate) fn build_bodyless(
    method: HttpMethod,
    credential: &Credential,
    url: String,
    query: Option<&Query>,
) -> HttpRequest {
    assemble(method, credential, url, query, None)
}

fn assemble(
    method: HttpMethod,
    credential: &Credential,
    url: String,
    query: Option<&Query>,
    body: Option<String>,
) -> HttpRequest {
    tracing::trace!(%method, %url, has_body = body.is_some(), "built request");
    HttpRequest {
        method,
        url,
        query: query.map(|q| q.pairs().to_vec()).unwrap_or_default(),
        headers: default_headers(credential),
        body,
    }
}

fn default_headers(credential: &Credential) -> Vec<(String, String)> {
    vec![
        ("content-type".to_string(), "application/json".to_string()),
        (
            "authorization".to_string(),
            credential.header_value().to_string(),
        ),
    ]
}
