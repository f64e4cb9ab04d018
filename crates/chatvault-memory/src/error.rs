//! Memory error types.

use chatvault_history::HistoryError;
use thiserror::Error;

/// Errors that can occur during embedding and vector operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The embedding model could not be loaded. Search degrades to empty results.
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// A remote vector backend could not be initialized.
    #[error("Vector backend '{backend}' failed to initialize: {message}")]
    BackendInitFailed { backend: &'static str, message: String },

    /// A vector does not match the dimension of the collection.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding generation failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A vector store call failed after initialization.
    #[error("Vector store error: {0}")]
    Backend(String),

    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Conversation store error.
    #[error(transparent)]
    History(#[from] HistoryError),
}

impl MemoryError {
    pub(crate) fn init_failed(backend: &'static str, message: impl Into<String>) -> Self {
        Self::BackendInitFailed {
            backend,
            message: message.into(),
        }
    }

    /// Fail if `actual` differs from `expected`.
    pub fn check_dimension(expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { expected, actual })
        }
    }
}
