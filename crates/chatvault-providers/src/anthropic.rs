//! Anthropic messages API.

use crate::pricing::estimate_cost;
use crate::{
    check_request, http_client, ChatBackend, ChatTurn, ProviderError, ProviderResponse, Result,
};
use async_trait::async_trait;
use chatvault_core::{Platform, Role, SecretString};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Anthropic API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";

/// API version header value.
const API_VERSION: &str = "2023-06-01";

/// Reply length cap sent with every request.
const MAX_TOKENS: u32 = 4096;

/// Models offered for new conversations.
pub const MODELS: &[&str] = &[
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

/// Anthropic backend.
pub struct AnthropicBackend {
    client: Client,
    api_base: String,
}

impl AnthropicBackend {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Split system turns into the separate `system` field.
    fn convert_turns(turns: &[ChatTurn]) -> (Option<String>, Vec<AnthropicMessage<'_>>) {
        let system: Vec<&str> = turns
            .iter()
            .filter(|t| t.role == Role::System)
            .map(|t| t.content.as_str())
            .collect();
        let system = (!system.is_empty()).then(|| system.join("\n\n"));

        let messages = turns
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|t| AnthropicMessage {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect();

        (system, messages)
    }

    fn parse_response(model: &str, response: AnthropicResponse) -> Result<ProviderResponse> {
        let content: String = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if content.is_empty() {
            return Err(ProviderError::upstream(None, "Empty response from Anthropic"));
        }

        let tokens = response.usage.input_tokens + response.usage.output_tokens;
        let cost = estimate_cost(Platform::Anthropic, model, tokens);

        Ok(ProviderResponse::new(content, tokens, cost)
            .with_meta("model", Some(model))
            .with_meta("finish_reason", response.stop_reason))
    }
}

#[async_trait]
impl ChatBackend for AnthropicBackend {
    fn platform(&self) -> Platform {
        Platform::Anthropic
    }

    async fn complete(
        &self,
        model: &str,
        api_key: &SecretString,
        turns: &[ChatTurn],
    ) -> Result<ProviderResponse> {
        check_request(api_key, turns)?;

        let (system, messages) = Self::convert_turns(turns);
        let request = AnthropicRequest {
            model,
            max_tokens: MAX_TOKENS,
            system,
            messages,
        };

        debug!("Sending request to Anthropic: model={}", model);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<AnthropicError>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("Anthropic returned HTTP {}", status.as_u16()),
            };
            return Err(ProviderError::from_status(status.as_u16(), model, message));
        }

        let response: AnthropicResponse = response.json().await?;
        Self::parse_response(model, response)
    }

    async fn list_models(&self, _api_key: Option<&SecretString>) -> Result<Vec<String>> {
        Ok(MODELS.iter().map(|m| m.to_string()).collect())
    }
}

// Anthropic API types

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key() -> SecretString {
        SecretString::new("sk-ant-test")
    }

    #[test]
    fn test_convert_splits_system() {
        let turns = [
            ChatTurn::system("You are terse."),
            ChatTurn::user("Hi"),
            ChatTurn::assistant("Hello."),
            ChatTurn::user("Bye"),
        ];
        let (system, messages) = AnthropicBackend::convert_turns(&turns);
        assert_eq!(system.as_deref(), Some("You are terse."));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_json(json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 4096,
                "system": "Be kind.",
                "messages": [{ "role": "user", "content": "Hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_01",
                "type": "message",
                "content": [{ "type": "text", "text": "Hello there" }],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 12, "output_tokens": 8 }
            })))
            .mount(&server)
            .await;

        let backend = AnthropicBackend::new().unwrap().with_base_url(server.uri());
        let reply = backend
            .complete(
                "claude-3-haiku-20240307",
                &key(),
                &[ChatTurn::system("Be kind."), ChatTurn::user("Hi")],
            )
            .await
            .unwrap();

        assert_eq!(reply.content, "Hello there");
        assert_eq!(reply.tokens, 20);
        assert_eq!(reply.metadata["finish_reason"], "end_turn");
        let expected = 20.0 * 0.7 * 0.000_000_25 + 20.0 * 0.3 * 0.000_001_25;
        assert!((reply.cost - expected).abs() < 1e-15);
    }

    #[tokio::test]
    async fn test_auth_failure_preserves_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": { "type": "authentication_error", "message": "invalid x-api-key" }
            })))
            .mount(&server)
            .await;

        let backend = AnthropicBackend::new().unwrap().with_base_url(server.uri());
        let err = backend
            .complete("claude-3-opus-20240229", &key(), &[ChatTurn::user("Hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AuthFailed(ref m) if m == "invalid x-api-key"));
    }

    #[tokio::test]
    async fn test_overloaded_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&server)
            .await;

        let backend = AnthropicBackend::new().unwrap().with_base_url(server.uri());
        let err = backend
            .complete("claude-3-opus-20240229", &key(), &[ChatTurn::user("Hi")])
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.vendor_message(), "Overloaded");
    }
}
