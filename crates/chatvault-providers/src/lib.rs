//! Chat-completion adapters for ChatVault.
//!
//! Three vendor APIs are normalized behind the [`ChatBackend`] capability:
//! - OpenAI (chat completions)
//! - Anthropic (messages)
//! - Google (Gemini `generateContent`)
//!
//! [`ChatProviderAdapter`] dispatches on the [`Platform`] tag. Each backend
//! reformats the turn sequence, calls the vendor with the caller's key,
//! extracts text, token usage and the stop reason, estimates cost from the
//! static price table, and translates vendor failures. Nothing retries.
//!
//! # Example
//!
//! ```rust,ignore
//! use chatvault_providers::{ChatProviderAdapter, ChatTurn};
//!
//! let adapter = ChatProviderAdapter::new(&config.providers)?;
//! let reply = adapter
//!     .send(Platform::OpenAI, "gpt-4", &api_key, &[ChatTurn::user("Hello")])
//!     .await?;
//! println!("{} ({} tokens, ${:.4})", reply.content, reply.tokens, reply.cost);
//! ```

mod error;
mod types;
mod adapter;
pub mod pricing;
pub mod openai;
pub mod anthropic;
pub mod google;

pub use adapter::ChatProviderAdapter;
pub use error::{ProviderError, Result};
pub use types::{ChatTurn, ProviderResponse};
pub use chatvault_core::Platform;

use async_trait::async_trait;
use chatvault_core::SecretString;
use std::time::Duration;

/// Request timeout for vendor calls.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// One vendor's chat-completion API.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Platform tag this backend serves.
    fn platform(&self) -> Platform;

    /// Send the turns and normalize the reply.
    async fn complete(
        &self,
        model: &str,
        api_key: &SecretString,
        turns: &[ChatTurn],
    ) -> Result<ProviderResponse>;

    /// Models offered to the user.
    async fn list_models(&self, api_key: Option<&SecretString>) -> Result<Vec<String>>;
}

/// Build the shared HTTP client.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Reject calls that cannot succeed before touching the network.
pub(crate) fn check_request(api_key: &SecretString, turns: &[ChatTurn]) -> Result<()> {
    if api_key.is_empty() {
        return Err(ProviderError::invalid_request("API key is required"));
    }
    if !turns.iter().any(|t| t.role != chatvault_core::Role::System) {
        return Err(ProviderError::invalid_request(
            "At least one user or assistant turn is required",
        ));
    }
    Ok(())
}
