//! Chat platform tags and message roles.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vendor whose chat-completion API a conversation talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    Google,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::OpenAI, Platform::Anthropic, Platform::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::OpenAI => "openai",
            Platform::Anthropic => "anthropic",
            Platform::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::OpenAI => "OpenAI",
            Platform::Anthropic => "Anthropic",
            Platform::Google => "Google",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    /// Case-insensitive; accepts the product names `chatgpt`, `claude` and `gemini`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "chatgpt" => Ok(Platform::OpenAI),
            "anthropic" | "claude" => Ok(Platform::Anthropic),
            "google" | "gemini" => Ok(Platform::Google),
            _ => Err(Error::UnknownPlatform(s.to_string())),
        }
    }
}

/// Speaker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalized label used in transcripts.
    pub fn title(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" | "human" => Ok(Role::User),
            "assistant" | "model" | "ai" => Ok(Role::Assistant),
            _ => Err(Error::UnknownRole(s.to_string())),
        }
    }
}
