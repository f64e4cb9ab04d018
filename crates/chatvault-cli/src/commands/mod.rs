//! CLI command implementations.

pub mod chat;
pub mod config;
pub mod conversations;
pub mod doctor;
pub mod export;
pub mod folders;
pub mod import;
pub mod keys;
pub mod search;
pub mod stats;
pub mod tags;

use chatvault_core::Platform;

/// Parse a platform tag for clap (`openai`, `anthropic`/`claude`, `google`/`gemini`).
pub(crate) fn parse_platform(value: &str) -> Result<Platform, String> {
    value.parse::<Platform>().map_err(|e| e.to_string())
}
