//! # chatvault-service
//!
//! Request-level flows over the history store, the chat providers and
//! semantic search:
//!
//! - [`ChatVault::send`]: persist the user turn, call the vendor, persist the
//!   reply and index both; the user turn is rolled back when the vendor fails
//! - [`ChatVault::semantic_search`]: query vectors and hydrate hits, dropping
//!   any hit that does not belong to the requester
//! - conversation deletion and transcript import keep the vector store in step

mod error;
mod vault;
mod chat;
mod search;

pub use error::{Result, ServiceError};
pub use vault::{ChatVault, SearchStatus};
pub use chat::{SendOutcome, SendRequest};
