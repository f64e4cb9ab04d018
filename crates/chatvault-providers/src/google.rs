//! Google Gemini `generateContent`.
//!
//! Gemini model identifiers churn, so every call first asks the vendor which
//! models support content generation and resolves the requested id against
//! that list with [`resolve_model`].

use crate::pricing::estimate_cost;
use crate::{
    check_request, http_client, ChatBackend, ChatTurn, ProviderError, ProviderResponse, Result,
};
use async_trait::async_trait;
use chatvault_core::{Platform, Role, SecretString};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default Gemini API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models offered when the vendor list is unavailable.
pub const MODELS: &[&str] = &[
    "gemini-pro",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-pro-latest",
    "gemini-1.5-flash-latest",
    "gemini-2.0-flash-exp",
];

/// Most widely served model id; target of the static mapping.
pub const FALLBACK_MODEL: &str = "gemini-pro";

/// Family keywords tried in order.
const FAMILIES: &[&str] = &["pro", "flash"];

const GENERATE_CONTENT: &str = "generateContent";

/// Pick the model to call.
///
/// 1. The requested id when the vendor lists it.
/// 2. The first listed model sharing its family keyword (`pro`, then `flash`).
/// 3. [`FALLBACK_MODEL`] when listed, else the first listed model.
///
/// An empty list means the vendor could not be asked; [`FALLBACK_MODEL`] is used.
pub fn resolve_model(requested: &str, available: &[String]) -> String {
    if available.is_empty() {
        return FALLBACK_MODEL.to_string();
    }
    if available.iter().any(|m| m == requested) {
        return requested.to_string();
    }

    let lower = requested.to_lowercase();
    if let Some(family) = FAMILIES.iter().find(|f| lower.contains(**f)) {
        if let Some(found) = available.iter().find(|m| m.to_lowercase().contains(*family)) {
            return found.clone();
        }
    }

    available
        .iter()
        .find(|m| *m == FALLBACK_MODEL)
        .or_else(|| available.first())
        .cloned()
        .unwrap_or_else(|| FALLBACK_MODEL.to_string())
}

/// Google Gemini backend.
pub struct GoogleBackend {
    client: Client,
    api_base: String,
}

impl GoogleBackend {
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

    /// Models the key may use for content generation, without the `models/`
    /// prefix. Empty when the vendor cannot be reached.
    pub async fn available_models(&self, api_key: &SecretString) -> Vec<String> {
        match self.fetch_models(api_key).await {
            Ok(models) => models,
            Err(e) => {
                warn!("Failed to list Gemini models: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_models(&self, api_key: &SecretString) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/models", self.api_base))
            .query(&[("key", api_key.expose_secret()), ("pageSize", "1000")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response, status.as_u16()).await;
            return Err(ProviderError::from_status(status.as_u16(), "", message));
        }

        let list: GoogleModelList = response.json().await?;
        Ok(list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|g| g == GENERATE_CONTENT)
            })
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }

    async fn error_message(response: reqwest::Response, status: u16) -> String {
        match response.json::<GoogleError>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("Gemini returned HTTP {}", status),
        }
    }

    fn convert_turns(turns: &[ChatTurn]) -> (Option<GoogleContent<'_>>, Vec<GoogleContent<'_>>) {
        let system: Vec<GooglePart<'_>> = turns
            .iter()
            .filter(|t| t.role == Role::System)
            .map(|t| GooglePart { text: &t.content })
            .collect();
        let system = (!system.is_empty()).then_some(GoogleContent {
            role: None,
            parts: system,
        });

        let contents = turns
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|t| GoogleContent {
                role: Some(match t.role {
                    Role::Assistant => "model",
                    _ => "user",
                }),
                parts: vec![GooglePart { text: &t.content }],
            })
            .collect();

        (system, contents)
    }

    fn parse_response(
        requested: &str,
        model: &str,
        response: GoogleResponse,
    ) -> Result<ProviderResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::upstream(None, "No response from Gemini"))?;

        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ProviderError::upstream(None, "Empty response from Gemini"));
        }

        let tokens = response
            .usage_metadata
            .map(|u| u.total_token_count)
            .unwrap_or(0);
        let cost = estimate_cost(Platform::Google, model, tokens);

        Ok(ProviderResponse::new(content, tokens, cost)
            .with_meta("model", Some(model))
            .with_meta("requested_model", Some(requested))
            .with_meta("finish_reason", candidate.finish_reason))
    }

    /// Google reports a bad key as a 400 with a message naming the key.
    fn translate(status: u16, model: &str, message: String, available: Vec<String>) -> ProviderError {
        let lower = message.to_lowercase();
        if status == 400 && (message.contains("API key") || lower.contains("authentication")) {
            return ProviderError::auth(message);
        }
        ProviderError::from_status(status, model, message).with_available(available)
    }
}

#[async_trait]
impl ChatBackend for GoogleBackend {
    fn platform(&self) -> Platform {
        Platform::Google
    }

    async fn complete(
        &self,
        model: &str,
        api_key: &SecretString,
        turns: &[ChatTurn],
    ) -> Result<ProviderResponse> {
        check_request(api_key, turns)?;

        let available = self.available_models(api_key).await;
        let resolved = resolve_model(model, &available);
        if resolved != model {
            debug!("Resolved Gemini model {} -> {}", model, resolved);
        }

        let (system_instruction, contents) = Self::convert_turns(turns);
        let request = GoogleRequest {
            system_instruction,
            contents,
        };

        debug!("Sending request to Gemini: model={}", resolved);

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.api_base, resolved))
            .query(&[("key", api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response, status.as_u16()).await;
            return Err(Self::translate(status.as_u16(), model, message, available));
        }

        let response: GoogleResponse = response.json().await?;
        Self::parse_response(model, &resolved, response)
    }

    async fn list_models(&self, api_key: Option<&SecretString>) -> Result<Vec<String>> {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let models = self.available_models(key).await;
            if !models.is_empty() {
                return Ok(models);
            }
        }
        Ok(MODELS.iter().map(|m| m.to_string()).collect())
    }
}

// Gemini API types

#[derive(Serialize)]
struct GoogleRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GoogleContent<'a>>,
    contents: Vec<GoogleContent<'a>>,
}

#[derive(Serialize)]
struct GoogleContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GooglePart<'a>>,
}

#[derive(Serialize)]
struct GooglePart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    usage_metadata: Option<GoogleUsage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleCandidate {
    content: Option<GoogleReplyContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GoogleReplyContent {
    #[serde(default)]
    parts: Vec<GoogleReplyPart>,
}

#[derive(Deserialize)]
struct GoogleReplyPart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleUsage {
    #[serde(default)]
    total_token_count: u64,
}

#[derive(Deserialize)]
struct GoogleModelList {
    #[serde(default)]
    models: Vec<GoogleModel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Deserialize)]
struct GoogleError {
    error: GoogleErrorDetail,
}

#[derive(Deserialize)]
struct GoogleErrorDetail {
    message: String,
}
