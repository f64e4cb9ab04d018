//! Semantic search for ChatVault.
//!
//! This crate provides:
//! - Embedding generation ([`EmbeddingProvider`]): a deterministic offline
//!   hashing model, a local ONNX model (`fastembed` feature) and OpenAI
//! - Vector storage ([`VectorStore`]) on Pinecone, Qdrant, or an in-process
//!   scan over vectors kept with the messages
//! - [`SemanticSearchService`], which indexes and queries messages per owner
//!
//! Scores are cosine similarity computed locally for every backend, so
//! ranking does not depend on which backend answered.

pub mod error;
pub mod embeddings;
pub mod store;
pub mod pinecone;
pub mod qdrant;
pub mod backend;
pub mod search;

pub use error::MemoryError;
pub use embeddings::{
    cosine_similarity, load_embedding_provider, EmbeddingOptions, EmbeddingProvider,
    HashEmbeddings, OpenAIEmbeddings,
};
pub use store::{InProcessVectorStore, VectorMatch, VectorStore};
pub use pinecone::PineconeStore;
pub use qdrant::QdrantStore;
pub use backend::connect;
pub use search::SemanticSearchService;

/// Result type for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
