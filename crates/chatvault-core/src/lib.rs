//! # chatvault-core
//!
//! Core types, configuration, and utilities for ChatVault.
//!
//! This crate provides shared functionality used across all ChatVault crates:
//!
//! - **Configuration**: Loading, validation, and management of the config file
//! - **Types**: Conversations, messages, folders, tags, API keys, and embedding records
//! - **Utilities**: Path resolution, environment handling, and secret strings

pub mod config;
pub mod types;
pub mod error;
pub mod paths;
pub mod env;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
pub use secret::SecretString;
