//! Response envelope shared by every endpoint
//!
//! Every response is a status, a serialized body and a header list. Status
//! codes outside the known set collapse to the fixed 400 envelope.

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

const PREFLIGHT_ALLOW_METHODS: &str = "POST, GET, OPTIONS, DELETE";
const PREFLIGHT_ALLOW_HEADERS: &str = "Content-Type";

const ACCESS_DENIED_BODY: &str = r#"{"message":"Access denied"}"#;
const BAD_CODE_BODY: &str = r#"{"message": "Internal Error: Bad Code"}"#;

/// Which envelope `format_response` should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Status(u16),
    /// CORS preflight answer
    Preflight,
}

impl From<u16> for ResponseKind {
    fn from(code: u16) -> Self {
        ResponseKind::Status(code)
    }
}

/// A fully formatted response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
    pub headers: HeaderMap,
}

impl ApiResponse {
    /// 200 with `body` serialized as JSON (strings are sent as-is)
    pub fn ok(body: Value) -> Self {
        format_response(ResponseKind::Status(200), Some(body))
    }

    /// Status line, e.g. `"200 OK"`
    pub fn status_line(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {}", self.status.as_u16(), reason),
            None => self.status.as_u16().to_string(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Build the response for `kind`.
///
/// | kind | status | body |
/// |---|---|---|
/// | 200 | `200 OK` | `body`, JSON-serialized unless it is a string |
/// | 401 | `401 Unauthorized` | `{"message":"Access denied"}` |
/// | 400 | `400 Bad Request` | `{"message": "Internal Error: Bad Code"}` |
/// | preflight | `200 OK` | empty, CORS allow headers |
///
/// Any other code produces exactly the 400 response.
pub fn format_response(kind: impl Into<ResponseKind>, body: Option<Value>) -> ApiResponse {
    match kind.into() {
        ResponseKind::Status(200) => ApiResponse {
            status: StatusCode::OK,
            body: serialize_body(body),
            headers: json_headers(),
        },
        ResponseKind::Status(401) => ApiResponse {
            status: StatusCode::UNAUTHORIZED,
            body: ACCESS_DENIED_BODY.to_string(),
            headers: json_headers(),
        },
        ResponseKind::Preflight => ApiResponse {
            status: StatusCode::OK,
            body: String::new(),
            headers: preflight_headers(),
        },
        ResponseKind::Status(_) => ApiResponse {
            status: StatusCode::BAD_REQUEST,
            body: BAD_CODE_BODY.to_string(),
            headers: json_headers(),
        },
    }
}

fn serialize_body(body: Option<Value>) -> String {
    match body {
        Some(Value::String(text)) => text,
        Some(value) => value.to_string(),
        None => Value::Null.to_string(),
    }
}

/// Headers carried by every JSON response
pub(crate) fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers
}

fn preflight_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(PREFLIGHT_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(PREFLIGHT_ALLOW_HEADERS),
    );
    headers
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn ok_serializes_json() {
        let response = ApiResponse::ok(json!({"token": "abc"}));
        assert_eq!(response.status_line(), "200 OK");
        assert_eq!(response.body, r#"{"token":"abc"}"#);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn string_body_is_sent_verbatim() {
        let response = ApiResponse::ok(json!("OK"));
        assert_eq!(response.body, "OK");
    }

    #[test]
    fn unauthorized_has_fixed_body() {
        let response = format_response(401, Some(json!({"ignored": true})));
        assert_eq!(response.status_line(), "401 Unauthorized");
        assert_eq!(response.body, r#"{"message":"Access denied"}"#);
    }

    #[test]
    fn unknown_codes_match_400() {
        let expected = format_response(400, None);
        assert_eq!(expected.status_line(), "400 Bad Request");
        assert_eq!(expected.body, r#"{"message": "Internal Error: Bad Code"}"#);

        for code in [201, 204, 302, 403, 404, 418, 500, 503] {
            let response = format_response(code, Some(json!({"x": 1})));
            assert_eq!(response.status, expected.status, "code {code}");
            assert_eq!(response.body, expected.body, "code {code}");
            assert_eq!(response.headers, expected.headers, "code {code}");
        }
    }

    #[test]
    fn preflight_envelope() {
        let response = format_response(ResponseKind::Preflight, None);
        assert_eq!(response.status_line(), "200 OK");
        assert!(response.body.is_empty());
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            response.header("access-control-allow-methods"),
            Some("POST, GET, OPTIONS, DELETE")
        );
        assert_eq!(
            response.header("access-control-allow-headers"),
            Some("Content-Type")
        );
        assert_eq!(response.header("content-type"), None);
    }
}
