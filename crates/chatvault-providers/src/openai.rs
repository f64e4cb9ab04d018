//! OpenAI chat completions.

use crate::pricing::estimate_cost;
use crate::{
    check_request, http_client, ChatBackend, ChatTurn, ProviderError, ProviderResponse, Result,
};
use async_trait::async_trait;
use chatvault_core::{Platform, SecretString};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default OpenAI API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Models offered for new conversations.
pub const MODELS: &[&str] = &["gpt-4-turbo-preview", "gpt-4", "gpt-3.5-turbo"];

/// OpenAI backend.
pub struct OpenAIBackend {
    client: Client,
    api_base: String,
}

impl OpenAIBackend {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Set the API base URL (for compatible APIs or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    fn convert_turns(turns: &[ChatTurn]) -> Vec<OpenAIMessage<'_>> {
        turns
            .iter()
            .map(|t| OpenAIMessage {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect()
    }

    fn parse_response(model: &str, response: OpenAIResponse) -> Result<ProviderResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::upstream(None, "No response from OpenAI"))?;

        let content = choice
            .message
            .content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::upstream(None, "Empty response from OpenAI"))?;

        let tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0);
        let cost = estimate_cost(Platform::OpenAI, model, tokens);

        Ok(ProviderResponse::new(content, tokens, cost)
            .with_meta("model", Some(model))
            .with_meta("finish_reason", choice.finish_reason))
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    fn platform(&self) -> Platform {
        Platform::OpenAI
    }

    async fn complete(
        &self,
        model: &str,
        api_key: &SecretString,
        turns: &[ChatTurn],
    ) -> Result<ProviderResponse> {
        check_request(api_key, turns)?;

        let request = OpenAIRequest {
            model,
            messages: Self::convert_turns(turns),
        };

        debug!("Sending request to OpenAI: model={}", model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<OpenAIError>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("OpenAI returned HTTP {}", status.as_u16()),
            };
            return Err(ProviderError::from_status(status.as_u16(), model, message));
        }

        let response: OpenAIResponse = response.json().await?;
        Self::parse_response(model, response)
    }

    async fn list_models(&self, _api_key: Option<&SecretString>) -> Result<Vec<String>> {
        Ok(MODELS.iter().map(|m| m.to_string()).collect())
    }
}

// OpenAI API types

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
}

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}
