//! Response envelope rendering.
//!
//! # Responsibilities
//! - Serialize bodies as JSON with sorted keys and four-space indentation
//! - Build the `{error, message}` body for faults
//! - Attach status and `Content-Type`
//!
//! # Design Decisions
//! - Bodies go through `serde_json::Value`, whose maps are ordered, so key
//!   order never depends on the handler's types
//! - Handler responses end with a newline; the Swagger document does not

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::fault::Fault;

/// Status and JSON body of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: StatusCode,
    pub body: Value,
}

impl ResponseEnvelope {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// The envelope for a fault. Internal faults carry no detail.
    pub fn from_fault(fault: &Fault) -> Self {
        Self {
            status: fault.status_code(),
            body: json!({
                "error": fault.label(),
                "message": fault.message(),
            }),
        }
    }

    /// Wire text: pretty JSON plus a trailing newline.
    pub fn to_text(&self) -> String {
        let mut text = to_pretty_json(&self.body);
        text.push('\n');
        text
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let text = self.to_text();
        json_response(self.status, text)
    }
}

/// Render any value as sorted, four-space indented JSON.
pub fn to_pretty_json<T: Serialize>(value: &T) -> String {
    // Going through Value sorts object keys.
    let value = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            json!({"error": crate::http::fault::INTERNAL_LABEL, "message": crate::http::fault::INTERNAL_MESSAGE})
        }
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut ser).is_err() {
        return "null".to_string();
    }
    String::from_utf8(buf).unwrap_or_default()
}

/// A response with a JSON content type.
pub fn json_response(status: StatusCode, text: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        text,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value() {
        let env = ResponseEnvelope::ok(json!({"a": 1}));
        assert_eq!(env.to_text(), "{\n    \"a\": 1\n}\n");
    }

    #[test]
    fn test_sorted_keys() {
        #[derive(Serialize)]
        struct Out {
            zeta: u8,
            alpha: u8,
        }
        assert_eq!(
            to_pretty_json(&Out { zeta: 1, alpha: 2 }),
            "{\n    \"alpha\": 2,\n    \"zeta\": 1\n}"
        );
    }

    #[test]
    fn test_fault_envelope() {
        let env = ResponseEnvelope::from_fault(&Fault::not_found("abc123"));
        assert_eq!(env.status, StatusCode::NOT_FOUND);
        assert_eq!(env.body, json!({"error": "Not Found", "message": "abc123"}));

        let env = ResponseEnvelope::from_fault(&Fault::internal(anyhow::anyhow!("secret")));
        assert_eq!(env.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            env.body,
            json!({"error": "Internal error", "message": "Server encountered an error"})
        );
        assert!(!env.to_text().contains("secret"));
    }
}
