//! Corpus → embeddings → persisted flat index.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::Document;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::utils::{ensure_dir, index_paths};
use crate::vector_db::FlatIndex;

/// Summary of one index build.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub indexed: usize,
    pub dim: usize,
    pub duration_ms: u128,
}

/// Embeds `corpus` in batches of `batch_size`, then writes `flat.index` and
/// `docs.jsonl` into `index_dir` (created if needed).
pub fn build_index_from_corpus(
    corpus: &[Document],
    index_dir: impl AsRef<Path>,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<IndexStats> {
    let index_dir = index_dir.as_ref();
    let started = Instant::now();
    info!(
        target: "contest_rag::ingest",
        docs = corpus.len(),
        model = embedder.model(),
        dir = %index_dir.display(),
        "build_index_from_corpus: start"
    );

    let mut index = FlatIndex::new(embedder.dim());
    for batch in corpus.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|doc| doc.text.clone()).collect();
        let vectors = embedder.encode(&texts)?;
        if vectors.nrows() != batch.len() {
            return Err(RagError::Embedding(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                vectors.nrows()
            )));
        }
        for (doc, vector) in batch.iter().zip(vectors.rows()) {
            index.add(doc.clone(), vector)?;
        }
    }

    ensure_dir(index_dir)?;
    let (index_path, docs_path) = index_paths(index_dir);
    index.save(&index_path, &docs_path)?;

    let stats = IndexStats {
        indexed: index.len(),
        dim: index.dim(),
        duration_ms: started.elapsed().as_millis(),
    };
    info!(
        target: "contest_rag::ingest",
        indexed = stats.indexed,
        dim = stats.dim,
        duration_ms = stats.duration_ms,
        "build_index_from_corpus: finished"
    );
    Ok(stats)
}
