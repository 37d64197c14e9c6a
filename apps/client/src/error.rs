//! Client-side error type and the mapping from HTTP responses to it.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Api { status: StatusCode, message: String },

    /// The refresh attempt failed or the replayed request was still rejected.
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    /// 400 from an AI or purchase endpoint. The cached balance has already
    /// been resynchronised to `credits`.
    #[error("{message}")]
    InsufficientCredits {
        message: String,
        credits: i64,
        required: Option<i64>,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Validation(#[from] resume_domain::ValidationErrors),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::InsufficientCredits { .. } => Some(StatusCode::BAD_REQUEST),
            ClientError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Turns a `detail` payload into the text shown to the user.
///
/// Strings pass through. Validation arrays become `field: message; ...`
/// where the field is the `loc` path after the leading `body` segment.
pub fn flatten_detail(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_item).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

fn flatten_item(item: &Value) -> Option<String> {
    let msg = item.get("msg").and_then(Value::as_str)?;
    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .map(|loc| {
            loc.iter()
                .skip_while(|seg| seg.as_str() == Some("body"))
                .map(|seg| match seg {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default();
    Some(if field.is_empty() {
        msg.to_string()
    } else {
        format!("{field}: {msg}")
    })
}

/// Builds the error for a non-success response body.
pub fn from_response(status: StatusCode, body: &[u8]) -> ClientError {
    let json: Option<Value> = serde_json::from_slice(body).ok();
    let message = json
        .as_ref()
        .and_then(|v| v.get("detail"))
        .and_then(flatten_detail)
        .unwrap_or_else(|| GENERIC_MESSAGE.to_string());

    if status == StatusCode::BAD_REQUEST && message.to_lowercase().contains("credit") {
        if let Some(credits) = json.as_ref().and_then(|v| v.get("credits")).and_then(Value::as_i64) {
            let required = json
                .as_ref()
                .and_then(|v| v.get("required"))
                .and_then(Value::as_i64);
            return ClientError::InsufficientCredits {
                message,
                credits,
                required,
            };
        }
    }

    ClientError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_validation_array_is_flattened() {
        let detail = json!([
            {"loc": ["body", "custom_links[0].label"], "msg": "is required", "type": "value_error"},
            {"loc": ["body", "experiences", 2, "company"], "msg": "too long", "type": "value_error"}
        ]);
        assert_eq!(
            flatten_detail(&detail).unwrap(),
            "custom_links[0].label: is required; experiences.2.company: too long"
        );
    }

    #[test]
    fn test_unreadable_body_falls_back_to_generic_message() {
        let err = from_response(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(err.to_string(), GENERIC_MESSAGE);
        let err = from_response(StatusCode::BAD_REQUEST, br#"{"detail": []}"#);
        assert_eq!(err.to_string(), GENERIC_MESSAGE);
    }

    #[test]
    fn test_credit_error_carries_balance() {
        let body = json!({
            "detail": "Insufficient credits. Required: 5, available: 2",
            "credits": 2,
            "required": 5
        });
        let err = from_response(StatusCode::BAD_REQUEST, body.to_string().as_bytes());
        match err {
            ClientError::InsufficientCredits { credits, required, .. } => {
                assert_eq!(credits, 2);
                assert_eq!(required, Some(5));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_credit_message_without_balance_is_plain_api_error() {
        let body = json!({ "detail": "Credits must be non-negative" });
        let err = from_response(StatusCode::BAD_REQUEST, body.to_string().as_bytes());
        assert!(matches!(err, ClientError::Api { status, .. } if status == StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_not_found_detection() {
        let err = from_response(StatusCode::NOT_FOUND, br#"{"detail": "Project not found"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Project not found");
    }
}
