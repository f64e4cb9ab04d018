//! Normalized request and response shapes.

use chatvault_core::{Message, Role};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One role-tagged unit of a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Rebuild the turn sequence from persisted messages, keeping their order.
    pub fn from_history(messages: &[Message]) -> Vec<ChatTurn> {
        messages
            .iter()
            .map(|m| ChatTurn::new(m.role, m.content.clone()))
            .collect()
    }
}

/// Normalized reply of any vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderResponse {
    pub content: String,
    pub tokens: u64,
    pub cost: f64,
    /// Model actually used and the vendor's stop/finish reason.
    pub metadata: Map<String, Value>,
}

impl ProviderResponse {
    pub fn new(content: String, tokens: u64, cost: f64) -> Self {
        Self {
            content,
            tokens,
            cost,
            metadata: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: Option<impl Into<Value>>) -> Self {
        if let Some(value) = value {
            self.metadata.insert(key.to_string(), value.into());
        }
        self
    }
}
