//! Contest-announcement retrieval: a flat vector index over short structured
//! documents, a confidence gate over the ranked hits, and an extractive
//! recommendation drafted when the evidence is strong enough.

pub mod compose;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gate;
pub mod ingest;
pub mod retriever;
pub mod utils;
pub mod vector_db;

pub use config::Plan;
pub use document::{ContextItem, Document};
pub use embedding::{
    Embedder, HashingEmbedder, OpenAiEmbedder, resolve_embedder, resolve_embedder_batched,
};
pub use error::{RagError, Result};
pub use gate::{GateResult, GateStatus};
pub use retriever::{ResponsePayload, RetrievalAgent, SearchMode, SearchStats};
pub use vector_db::FlatIndex;
