//! Service error types.

use chatvault_core::error::ConfigError;
use chatvault_core::Platform;
use chatvault_history::HistoryError;
use chatvault_memory::MemoryError;
use chatvault_providers::ProviderError;
use thiserror::Error;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced to the request layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// No active API key for the platform.
    #[error("API key not configured for {0}")]
    MissingApiKey(Platform),

    /// Chat vendor failure, with the vendor's message.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceError {
    /// Whether the error means a record does not exist for the user.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::History(e) if e.is_not_found())
    }
}
