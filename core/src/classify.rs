//! Response classifier.
//!
//! Turns the transport outcome into the caller-visible result. The service
//! signals success only with 200, 201 and 204; every other status is an
//! application error whose message comes from the `description` field of
//! the JSON body.

use serde_json::Value;

use crate::error::{ApiError, TransportError};
use crate::http::HttpResponse;

/// `Some(data)` for a JSON success body, `None` for 204.
pub type Classified = Option<Value>;

/// Classify one transport outcome for the request at `path`.
///
/// Emits a single `debug` event per call with the status (or transport
/// error), the path and the raw body.
pub fn classify(
    path: &str,
    outcome: Result<HttpResponse, TransportError>,
) -> Result<Classified, ApiError> {
    let response = match outcome {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%path, %error, "transport error");
            return Err(ApiError::Transport(error));
        }
    };
    tracing::debug!(
        status = response.status,
        %path,
        body = %response.body,
        "api response"
    );
    classify_response(&response)
}

/// The status/body decision table, without diagnostics.
pub fn classify_response(response: &HttpResponse) -> Result<Classified, ApiError> {
    match response.status {
        204 => Ok(None),
        200 | 201 => serde_json::from_str::<Value>(&response.body)
            .map(Some)
            .map_err(|_| ApiError::not_json()),
        status => match serde_json::from_str::<Value>(&response.body) {
            Ok(payload) => Err(application_error(status, payload)),
            Err(_) => Err(ApiError::not_json()),
        },
    }
}

fn application_error(status: u16, payload: Value) -> ApiError {
    let message = match payload.get("description").and_then(Value::as_str) {
        Some(description) => description.to_string(),
        None => format!("Request failed with status {status}"),
    };
    ApiError::Application {
        status,
        message,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, NOT_JSON_MESSAGE};
    use serde_json::json;
    use tracing_test::traced_test;

    fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(status, body))
    }

    #[test]
    fn json_success_bodies_are_returned_parsed() {
        for status in [200, 201] {
            let data = classify("/api/v2/tickets/1", ok(status, r#"{"id":1,"tags":["a"]}"#))
                .unwrap()
                .unwrap();
            assert_eq!(data, json!({"id": 1, "tags": ["a"]}));
        }
    }

    #[test]
    fn non_json_success_body_is_decode_error() {
        for status in [200, 201] {
            let err = classify("/api/v2/tickets", ok(status, "not json")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Decode);
            assert_eq!(err.message(), NOT_JSON_MESSAGE);
            assert!(err.payload().is_none());
        }
    }

    #[test]
    fn empty_success_body_is_decode_error() {
        let err = classify("/api/v2/tickets", ok(200, "")).unwrap_err();
        assert_eq!(err.message(), NOT_JSON_MESSAGE);
    }

    #[test]
    fn no_content_ignores_body() {
        assert_eq!(classify("/api/v2/tickets/1", ok(204, "")).unwrap(), None);
        assert_eq!(classify("/api/v2/tickets/1", ok(204, "<html>")).unwrap(), None);
        assert_eq!(classify("/api/v2/tickets/1", ok(204, r#"{"a":1}"#)).unwrap(), None);
    }

    #[test]
    fn conflict_uses_description_as_message() {
        let body = r#"{"description":"Name has already been taken"}"#;
        let err = classify("/api/v2/companies", ok(409, body)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.message(), "Name has already been taken");
        assert_eq!(err.status(), Some(409));
        assert_eq!(
            err.payload(),
            Some(&json!({"description": "Name has already been taken"}))
        );
    }

    #[test]
    fn missing_description_falls_back_to_status_message() {
        let body = r#"{"code":"invalid_credentials","message":"You have to be logged in"}"#;
        let err = classify("/api/v2/tickets", ok(401, body)).unwrap_err();
        assert_eq!(err.message(), "Request failed with status 401");
        assert_eq!(err.payload().unwrap()["code"], "invalid_credentials");
    }

    #[test]
    fn non_string_description_falls_back_to_status_message() {
        let err = classify("/api/v2/tickets", ok(400, r#"{"description":42}"#)).unwrap_err();
        assert_eq!(err.message(), "Request failed with status 400");
    }

    #[test]
    fn non_json_error_body_is_decode_error() {
        for status in [302, 404, 429, 500, 503] {
            let err = classify("/api/v2/tickets/9", ok(status, "Internal error")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Decode);
            assert_eq!(err.message(), NOT_JSON_MESSAGE);
            assert!(err.payload().is_none());
        }
    }

    #[test]
    fn transport_error_passes_through() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = classify("/api/v2/tickets", Err(TransportError::new(io))).unwrap_err();
        match err {
            ApiError::Transport(inner) => {
                assert_eq!(inner.to_string(), "refused");
                assert!(inner.downcast_ref::<std::io::Error>().is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    #[traced_test]
    fn response_line_has_status_path_and_body() {
        let _ = classify("/api/v2/contacts/5", ok(404, "missing"));
        assert!(logs_contain("api response"));
        assert!(logs_contain("status=404"));
        assert!(logs_contain("/api/v2/contacts/5"));
        assert!(logs_contain("missing"));
    }

    #[test]
    #[traced_test]
    fn transport_line_has_error_and_path() {
        let _ = classify("/api/v2/companies", Err(TransportError::new("dns failure")));
        assert!(logs_contain("transport error"));
        assert!(logs_contain("dns failure"));
        assert!(logs_contain("/api/v2/companies"));
    }
}
