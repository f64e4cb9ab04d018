//! Error types for chat providers.

use thiserror::Error;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Chat provider errors.
///
/// Vendor failures are translated into the first four variants; each keeps the
/// vendor's own message.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The vendor rejected the API key.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The vendor throttled the request.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The requested model does not exist for this key.
    #[error("Model '{model}' not found: {message}")]
    ModelNotFound {
        model: String,
        message: String,
        /// Models the vendor reported as usable, when known.
        available: Vec<String>,
    },

    /// Any other vendor or transport failure.
    #[error("Upstream error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    UpstreamError { status: Option<u16>, message: String },

    /// The call was malformed before reaching the vendor.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No backend registered for a platform.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthFailed(message.into())
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimited(message.into())
    }

    pub fn model_not_found(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelNotFound {
            model: model.into(),
            message: message.into(),
            available: Vec::new(),
        }
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Translate a vendor HTTP failure.
    pub fn from_status(status: u16, model: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::AuthFailed(message),
            429 => Self::RateLimited(message),
            404 => Self::model_not_found(model, message),
            _ => Self::upstream(Some(status), message),
        }
    }

    /// Attach the vendor's model list to a `ModelNotFound`.
    pub fn with_available(self, models: Vec<String>) -> Self {
        match self {
            Self::ModelNotFound { model, message, .. } => Self::ModelNotFound {
                model,
                message,
                available: models,
            },
            other => other,
        }
    }

    /// Whether a caller could reasonably retry. Nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::UpstreamError { status, .. } => status.map_or(true, |s| s >= 500),
            _ => false,
        }
    }

    /// Vendor diagnostic text.
    pub fn vendor_message(&self) -> &str {
        match self {
            Self::AuthFailed(m)
            | Self::RateLimited(m)
            | Self::InvalidRequest(m)
            | Self::UnsupportedPlatform(m)
            | Self::Config(m) => m,
            Self::ModelNotFound { message, .. } | Self::UpstreamError { message, .. } => message,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::UpstreamError {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::UpstreamError {
            status: None,
            message: format!("Malformed response: {}", e),
        }
    }
}
