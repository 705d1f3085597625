//! Generation Client — the single point of entry for all model calls in
//! Waypoint.
//!
//! ARCHITECTURAL RULE: no other module may call the Anthropic API directly.
//! All generation goes through `GenerationClient::generate`, which takes a
//! rendered prompt plus the required output schema and returns either a
//! schema-conformant JSON value or a structured failure. Provider output is
//! untrusted input: it is validated against the schema before anything
//! downstream sees it, and is never coerced or repaired.
//!
//! No retries happen here. Retry policy belongs to callers so call counts and
//! backoff can be tuned per pipeline without touching transport code.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::prompt::RenderedPrompt;
use crate::schema::{Schema, ValidationError};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all generation calls in Waypoint.
/// Intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;

/// Why the provider side of a generation call failed. `Timeout` is reported
/// both for transport-level expiry and for the pipeline's own deadline.
#[derive(Debug, Error)]
pub enum ProviderCause {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport/provider-side failure. Retryable from the caller's point of
    /// view; the cause says whether retrying is worthwhile.
    #[error("provider failure: {cause}")]
    Provider { cause: ProviderCause },

    /// The model's response parsed as JSON but did not conform to the
    /// declared output schema. Not retried or repaired here.
    #[error("model output did not match schema '{schema}': {error}")]
    SchemaMismatch {
        schema: &'static str,
        error: ValidationError,
    },
}

/// The boundary abstraction over the generative-model provider. Stateless and
/// thread-safe; one instance is constructed at startup and shared by
/// reference across arbitrarily many concurrent invocations.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        output_schema: &Schema,
    ) -> Result<Value, GenerationError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<RequestBlock<'a>>,
}

/// A request content block. Documents travel in their own block, separate
/// from the prompt text, because the model consumes them through a different
/// input slot.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RequestBlock<'a> {
    Text { text: &'a str },
    Document { source: DocumentSource<'a> },
}

#[derive(Debug, Serialize)]
struct DocumentSource<'a> {
    #[serde(rename = "type")]
    source_type: &'a str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct LlmResponse {
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

impl LlmResponse {
    /// Extracts the text content from the first text block.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// `GenerationClient` over the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
}

impl AnthropicClient {
    /// Builds a client with a finite request timeout. The transport never
    /// hangs indefinitely; expiry surfaces as `ProviderCause::Timeout`.
    pub fn new(api_key: String, timeout: std::time::Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn call(
        &self,
        prompt: &RenderedPrompt,
        schema_hint: &str,
    ) -> Result<String, ProviderCause> {
        let instruction = format!(
            "{}\n\n{}\n{}\n{}",
            prompt.text,
            prompts::SCHEMA_HINT_HEADER,
            schema_hint,
            prompts::SCHEMA_HINT_FOOTER
        );

        let mut content = Vec::with_capacity(2);
        if let Some(att) = &prompt.attachment {
            content.push(RequestBlock::Document {
                source: DocumentSource {
                    source_type: "base64",
                    media_type: &att.media_type,
                    data: &att.data,
                },
            });
        }
        content.push(RequestBlock::Text { text: &instruction });

        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: prompts::JSON_ONLY_SYSTEM,
            messages: vec![AnthropicMessage {
                role: "user",
                content,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderCause::Timeout
                } else {
                    ProviderCause::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!("Anthropic API returned {status}: {message}");
            return Err(ProviderCause::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response
            .json()
            .await
            .map_err(|e| ProviderCause::MalformedResponse(e.to_string()))?;

        debug!(
            template = prompt.template_id,
            input_tokens = llm_response.usage.input_tokens,
            output_tokens = llm_response.usage.output_tokens,
            "generation call succeeded"
        );

        llm_response
            .text()
            .map(|t| t.to_string())
            .ok_or(ProviderCause::EmptyContent)
    }
}

#[async_trait]
impl GenerationClient for AnthropicClient {
    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        output_schema: &Schema,
    ) -> Result<Value, GenerationError> {
        let text = self
            .call(prompt, &output_schema.describe())
            .await
            .map_err(|cause| GenerationError::Provider { cause })?;

        let text = strip_json_fences(&text);
        let value: Value = serde_json::from_str(text).map_err(|e| GenerationError::Provider {
            cause: ProviderCause::MalformedResponse(e.to_string()),
        })?;

        output_schema
            .validate(&value)
            .map_err(|error| GenerationError::SchemaMismatch {
                schema: output_schema.name,
                error,
            })?;

        Ok(value)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
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
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_document_block_serializes_to_base64_source() {
        let block = RequestBlock::Document {
            source: DocumentSource {
                source_type: "base64",
                media_type: "application/pdf",
                data: "JVBERi0xLjQ=",
            },
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "document");
        assert_eq!(json["source"]["type"], "base64");
        assert_eq!(json["source"]["media_type"], "application/pdf");
        assert_eq!(json["source"]["data"], "JVBERi0xLjQ=");
    }

    #[test]
    fn test_text_block_serializes_with_type_tag() {
        let block = RequestBlock::Text { text: "hello" };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn test_llm_response_text_picks_first_text_block() {
        let json = r#"{
            "content": [
                {"type": "thinking", "text": null},
                {"type": "text", "text": "{\"ok\": true}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("{\"ok\": true}"));
    }
}
