use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use resume_domain::ValidationErrors;
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Bodies follow the `{"detail": ...}` shape the web client already parses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Payment gateway error: {0}")]
    Payment(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// `Json` extractor whose rejections use the same `{"detail": ...}` bodies as
/// every other error. Malformed JSON is a 400; a body that parses but does not
/// fit the request type is a 422 naming the offending field.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::Validation(data_errors(&e.body_text())),
            JsonRejection::JsonSyntaxError(_) => AppError::BadRequest("Malformed JSON body".into()),
            JsonRejection::MissingJsonContentType(_) => {
                AppError::BadRequest("Expected a JSON body (Content-Type: application/json)".into())
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// Turns a deserialization message into a field error. The message reads
/// `<prefix>: [path: ]<serde error>[ at line L column C]`.
fn data_errors(text: &str) -> ValidationErrors {
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    let detail = detail.find(" at line ").map_or(detail, |i| &detail[..i]);

    let mut errors = ValidationErrors::new();
    if let Some(rest) = detail.strip_prefix("missing field `") {
        let field = rest.split('`').next().unwrap_or_default();
        errors.push(field, "field required");
        return errors;
    }
    match detail.split_once(": ") {
        Some((path, message)) if is_field_path(path) => errors.push(path, message),
        _ => errors.push("", detail),
    }
    errors
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Llm(e.to_string())
    }
}

fn validation_body(errors: &ValidationErrors) -> Value {
    let detail: Vec<Value> = errors
        .iter()
        .map(|e| {
            json!({
                "loc": ["body", e.field],
                "msg": e.message,
                "type": "value_error"
            })
        })
        .collect();
    json!({ "detail": detail })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "detail": msg })),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "detail": msg })),
            AppError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, validation_body(errors))
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "detail": msg })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "detail": msg })),
            AppError::InsufficientCredits {
                required,
                available,
            } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "detail": format!(
                        "Insufficient credits. Required: {required}, available: {available}"
                    ),
                    "credits": available,
                    "required": required
                }),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                internal("A database error occurred")
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {e}");
                internal("A cache error occurred")
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                internal("An AI processing error occurred")
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                internal("A storage error occurred")
            }
            AppError::Payment(msg) => {
                tracing::error!("Payment gateway error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "detail": "The payment gateway could not process the request" }),
                )
            }
            AppError::Mail(msg) => {
                tracing::error!("Mail error: {msg}");
                internal("Failed to send email")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                internal("An internal server error occurred")
            }
        };

        (status, Json(body)).into_response()
    }
}

fn internal(message: &str) -> (StatusCode, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": message }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_uses_fastapi_shape() {
        let mut errors = ValidationErrors::new();
        errors.push("custom_links[0].label", "must be at most 20 characters (got 21)");
        let response = AppError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["detail"][0]["loc"][1], "custom_links[0].label");
        assert_eq!(body["detail"][0]["type"], "value_error");
    }

    #[tokio::test]
    async fn test_insufficient_credits_carries_balance() {
        let response = AppError::InsufficientCredits {
            required: 5,
            available: 3,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["credits"], 3);
        assert_eq!(body["required"], 5);
        assert!(body["detail"].as_str().unwrap().contains("credits"));
    }

    #[test]
    fn test_missing_field_named_in_detail() {
        let errors = data_errors(
            "Failed to deserialize the JSON body into the target type: missing field `password` at line 1 column 19",
        );
        assert!(errors.has_field("password"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_mistyped_field_keeps_its_path() {
        let errors = data_errors(
            "Failed to deserialize the JSON body into the target type: custom_links[0].label: invalid type: integer `5`, expected a string at line 1 column 40",
        );
        let err = errors.iter().next().unwrap();
        assert_eq!(err.field, "custom_links[0].label");
        assert_eq!(err.message, "invalid type: integer `5`, expected a string");
    }

    #[test]
    fn test_root_level_data_error_has_no_field() {
        let errors = data_errors(
            "Failed to deserialize the JSON body into the target type: invalid type: sequence, expected struct LoginRequest at line 1 column 1",
        );
        let err = errors.iter().next().unwrap();
        assert_eq!(err.field, "");
        assert!(err.message.starts_with("invalid type: sequence"));
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let response = AppError::Storage("bucket 'x' missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "A storage error occurred");
    }
}
