//! Completion client trait and the HTTP gateway implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{ChatMessage, Completion, Role, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const STRUCTURED_RETRIES: usize = 3;

/// Errors from the completion client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response was not valid JSON after {attempts} attempts: {message}")]
    MalformedOutput { attempts: usize, message: String },

    #[error("LLM response missing content")]
    EmptyResponse,
}

/// The LLM collaborator seam.
///
/// `schema` is a JSON Schema describing the expected response shape; the
/// returned `Completion.content` is guaranteed to be parseable JSON (the
/// client retries malformed output internally).
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        schema: &Value,
    ) -> Result<Completion, LlmError>;
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_tokens: u32,
}

impl GatewayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 60,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// HTTP completion client speaking the Anthropic messages API.
pub struct GatewayClient {
    config: GatewayConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
    usage: ApiUsage,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u64,
    output_tokens: u64,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { config, http })
    }

    async fn request_once(
        &self,
        messages: &[ChatMessage],
        model: &str,
        schema: &Value,
    ) -> Result<(String, TokenUsage, String), LlmError> {
        // System messages ride in the dedicated `system` field; the schema
        // instruction is appended there so user content stays untouched.
        let mut system_parts: Vec<String> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.clone())
            .collect();
        system_parts.push(format!(
            "Respond with a single JSON object matching this JSON Schema, with no \
             surrounding prose or code fences:\n{schema}"
        ));

        let api_messages: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::Assistant => "assistant",
                        _ => "user",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let body = json!({
            "model": model,
            "max_tokens": self.config.max_tokens,
            "system": system_parts.join("\n\n"),
            "messages": api_messages,
        });

        let response = self
            .http
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiResponse = response.json().await?;
        let text = parsed
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or(LlmError::EmptyResponse)?;
        let usage = TokenUsage {
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
        };
        let model = if parsed.model.is_empty() {
            model.to_string()
        } else {
            parsed.model
        };
        Ok((text, usage, model))
    }
}

#[async_trait]
impl CompletionClient for GatewayClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        schema: &Value,
    ) -> Result<Completion, LlmError> {
        let mut usage = TokenUsage::default();
        let mut last_error = String::new();
        let mut resolved_model = model.to_string();

        for attempt in 1..=STRUCTURED_RETRIES {
            let (text, call_usage, call_model) =
                self.request_once(messages, model, schema).await?;
            usage.input_tokens += call_usage.input_tokens;
            usage.output_tokens += call_usage.output_tokens;
            resolved_model = call_model;

            match parse_json_payload(&text) {
                Ok(content) => {
                    debug!(model, attempt, "structured completion parsed");
                    return Ok(Completion {
                        content,
                        usage,
                        model: resolved_model,
                    });
                }
                Err(err) => {
                    warn!(model, attempt, error = %err, "structured output parse failed");
                    last_error = err;
                }
            }
        }

        Err(LlmError::MalformedOutput {
            attempts: STRUCTURED_RETRIES,
            message: last_error,
        })
    }
}

/// Extract a JSON object from model output, tolerating code fences and
/// leading/trailing prose.
fn parse_json_payload(text: &str) -> Result<Value, String> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let without_fences = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim);
    if let Some(inner) = without_fences {
        if let Ok(value) = serde_json::from_str::<Value>(inner) {
            return Ok(value);
        }
    }

    // Last resort: widest brace-delimited slice.
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(format!("no JSON object found in {} bytes of output", text.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let value = parse_json_payload(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn parses_fenced_json() {
        let value = parse_json_payload("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn parses_json_with_prose() {
        let value = parse_json_payload("Here you go:\n{\"ok\": true}\nDone.").unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_json_payload("no json here").is_err());
    }
}
