//! Language model access. Every AI feature goes through [`LanguageModel`];
//! nothing else talks to the provider API.
//!
//! `AppState` carries an `Arc<dyn LanguageModel>` so handlers can be tested
//! against a scripted model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gave up after {retries} retries")]
    Exhausted { retries: u32 },

    #[error("Model returned empty content")]
    EmptyContent,
}

/// One prompt/response exchange.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Input plus output tokens, as logged per user.
    pub tokens_used: i64,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, LlmError>;
}

/// Calls the model and parses its reply as JSON. The prompt must ask for JSON.
pub async fn complete_json<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    request: CompletionRequest<'_>,
) -> Result<(T, i64), LlmError> {
    let completion = model.complete(request).await?;
    let parsed = serde_json::from_str(strip_json_fences(&completion.text))?;
    Ok((parsed, completion.tokens_used))
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Anthropic Messages API client with retry on 429 and 5xx.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
            api_key,
        })
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system,
            messages: [Message {
                role: "user",
                content: request.prompt,
            }],
        };

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(1000 << (attempt - 1));
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying model call");
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                warn!(%status, "model API unavailable: {text}");
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: text,
                });
                continue;
            }
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                    .map(|e| e.error.message)
                    .unwrap_or(text);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: MessagesResponse = response.json().await?;
            let text = parsed
                .content
                .into_iter()
                .find(|b| b.block_type == "text")
                .and_then(|b| b.text)
                .filter(|t| !t.trim().is_empty())
                .ok_or(LlmError::EmptyContent)?;
            let tokens_used = i64::from(parsed.usage.input_tokens + parsed.usage.output_tokens);
            debug!(tokens_used, "model call succeeded");
            return Ok(Completion { text, tokens_used });
        }

        Err(last_error.unwrap_or(LlmError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}

/// Strips a surrounding ```json fence if the model added one.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(rest) => rest.trim().strip_suffix("```").unwrap_or(rest).trim(),
        None => text,
    }
}

/// Splits a bullet list reply into clean lines, dropping list markers.
pub fn parse_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.trim_start_matches(['-', '*', '•']).trim_start();
            let digits = line.find(|c: char| !c.is_ascii_digit()).unwrap_or(0);
            match line[digits..].strip_prefix(['.', ')']) {
                Some(rest) if digits > 0 => rest.trim_start(),
                _ => line,
            }
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n[1, 2]\n```";
        assert_eq!(strip_json_fences(input), "[1, 2]");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        assert_eq!(strip_json_fences(" {} "), "{}");
    }

    #[test]
    fn test_parse_bullets_strips_markers() {
        let text = "- Built a parser\n\n* Cut latency by 40%\n2. Led migration\n• Shipped v2\n2024 roadmap";
        assert_eq!(
            parse_bullets(text),
            vec![
                "Built a parser",
                "Cut latency by 40%",
                "Led migration",
                "Shipped v2",
                "2024 roadmap"
            ]
        );
    }

    #[tokio::test]
    async fn test_complete_json_reports_tokens() {
        let model = testing::ScriptedModel::replying(&["```json\n{\"n\": 3}\n```"]);
        let request = CompletionRequest {
            system: "s",
            prompt: "p",
            max_tokens: 10,
            temperature: 0.0,
        };
        let (value, tokens): (serde_json::Value, i64) =
            complete_json(&model, request).await.unwrap();
        assert_eq!(value["n"], 3);
        assert_eq!(tokens, 42);
    }

    #[tokio::test]
    async fn test_complete_json_propagates_api_errors() {
        let model = testing::ScriptedModel::default();
        model.push_err("overloaded");
        let request = CompletionRequest {
            system: "s",
            prompt: "p",
            max_tokens: 10,
            temperature: 0.0,
        };
        let err = complete_json::<serde_json::Value>(&model, request)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }
}
