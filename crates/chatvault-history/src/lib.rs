//! # chatvault-history
//!
//! Persistence for conversations, messages, folders, tags, API keys and
//! embedding records.
//!
//! The narrow [`ConversationStore`] trait is what chat sending and semantic
//! search depend on. [`HistoryStore`] implements it and adds the rest of the
//! CRUD surface, keyword search, usage statistics, transcript export and
//! transcript import.

mod error;
mod state;
mod store;
mod catalog;
mod keys;
mod search;
pub mod stats;
pub mod export;
pub mod import;

pub use error::{HistoryError, Result};
pub use store::{
    ConversationFilter, ConversationStore, ConversationUpdate, HistoryStore, MessageEntry,
    NewConversation, NewMessage, Page, Paginated,
};
pub use catalog::{FolderUpdate, TagUpdate};
pub use keys::ApiKeySummary;
pub use search::{snippet, MessageHit, SNIPPET_CHARS};
pub use stats::UsageStats;
pub use export::{Export, ExportFormat};
pub use import::ImportedConversation;

/// Default page size for conversation listings.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default result count for keyword search.
pub const DEFAULT_TEXT_SEARCH_LIMIT: usize = 20;

/// Maximum characters kept from the first message when titling a conversation.
pub const TITLE_CHARS: usize = 100;
