//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            /// Accepts both the bare number and the prefixed form (`msg-42`).
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                s.parse().map(Self)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a persisted message. Also keys the message's vector.
    MessageId,
    "msg"
);
numeric_id!(
    /// Identifier of a conversation.
    ConversationId,
    "conv"
);
numeric_id!(
    /// Identifier of a folder.
    FolderId,
    "folder"
);
numeric_id!(
    /// Identifier of a tag.
    TagId,
    "tag"
);
numeric_id!(
    /// Identifier of a stored API key.
    ApiKeyId,
    "key"
);

impl MessageId {
    /// External vector id used by remote vector stores.
    pub fn vector_id(self) -> String {
        format!("msg-{}", self.0)
    }
}

/// Identifier of the user that owns data. Every query is scoped by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new("local")
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_vector_id() {
        assert_eq!(MessageId::new(42).vector_id(), "msg-42");
    }

    #[test]
    fn test_id_parse_accepts_prefix() {
        assert_eq!("msg-7".parse::<MessageId>().unwrap(), MessageId::new(7));
        assert_eq!("7".parse::<MessageId>().unwrap(), MessageId::new(7));
        assert_eq!("conv-3".parse::<ConversationId>().unwrap(), ConversationId::new(3));
        assert!("msg-x".parse::<MessageId>().is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&TagId::new(9)).unwrap();
        assert_eq!(json, "9");
        let owner: OwnerId = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(owner.as_str(), "alice");
    }

    #[test]
    fn test_owner_trimmed() {
        assert_eq!(OwnerId::new("  bob "), OwnerId::new("bob"));
    }
}
