//! Error type shared by every stage of the pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = RagError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RagError {
    /// One of the two persisted index artifacts is absent.
    #[error("vector index not found in {}; run `ingest` first", dir.display())]
    IndexNotFound { dir: PathBuf },

    /// The embedding model disagrees with the dimension the index was built with.
    #[error("embedding dimension does not match the index (index={index}, embedder={embedder})")]
    DimensionMismatch { index: usize, embedder: usize },

    /// A vector handed to the index has the wrong length.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("unknown embedding model: {0}")]
    UnknownModel(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_not_found_names_directory() {
        let err = RagError::IndexNotFound {
            dir: PathBuf::from("indices/missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("indices/missing"));
        assert!(msg.contains("ingest"));
    }

    #[test]
    fn dimension_mismatch_names_both_dims() {
        let msg = RagError::DimensionMismatch {
            index: 1536,
            embedder: 384,
        }
        .to_string();
        assert!(msg.contains("1536"));
        assert!(msg.contains("384"));
    }
}
