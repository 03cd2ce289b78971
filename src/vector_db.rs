use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::{ContextItem, Document};
use crate::error::{RagError, Result};

/// Exact nearest-neighbour index over L2-normalised vectors.
///
/// Scores are inner products, i.e. cosine similarity. Rows of `vectors` line
/// up with `docs` by position.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    vectors: Array2<f32>,
    docs: Vec<Document>,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    dim: usize,
    vectors: Array2<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        FlatIndex {
            dim,
            vectors: Array2::zeros((0, dim)),
            docs: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn add(&mut self, document: Document, vector: ArrayView1<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(RagError::VectorSizeMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        let normalized = normalize(vector);
        self.vectors.push_row(normalized.view())?;
        self.docs.push(document);
        Ok(())
    }

    /// Up to `top_k` hits, best first. Equal scores keep insertion order.
    pub fn search(&self, query: ArrayView1<f32>, top_k: usize) -> Result<Vec<ContextItem>> {
        if query.len() != self.dim {
            return Err(RagError::VectorSizeMismatch {
                got: query.len(),
                want: self.dim,
            });
        }
        if top_k == 0 || self.docs.is_empty() {
            return Ok(Vec::new());
        }

        let query = normalize(query);
        let scores = self.vectors.dot(&query);

        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(ranked
            .into_iter()
            .take(top_k)
            .map(|(i, score)| ContextItem {
                document: self.docs[i].clone(),
                score,
            })
            .collect())
    }

    /// Writes the matrix to `index_path` and one JSON document per line to `docs_path`.
    pub fn save(&self, index_path: impl AsRef<Path>, docs_path: impl AsRef<Path>) -> Result<()> {
        let index_file = IndexFile {
            dim: self.dim,
            vectors: self.vectors.clone(),
        };
        let mut writer = BufWriter::new(File::create(index_path.as_ref())?);
        serde_json::to_writer(&mut writer, &index_file)?;
        writer.flush()?;

        save_docs_jsonl(&self.docs, docs_path.as_ref())?;

        info!(
            target: "contest_rag::store",
            index = %index_path.as_ref().display(),
            docs = self.docs.len(),
            dim = self.dim,
            "index saved"
        );
        Ok(())
    }

    pub fn load(index_path: impl AsRef<Path>, docs_path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(index_path.as_ref())?);
        let index_file: IndexFile = serde_json::from_reader(reader)?;

        let mut docs = Vec::new();
        let reader = BufReader::new(File::open(docs_path.as_ref())?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            docs.push(serde_json::from_str::<Document>(&line)?);
        }

        if index_file.vectors.ncols() != index_file.dim {
            return Err(RagError::InvalidConfig(format!(
                "index declares dim {} but stores vectors of width {}",
                index_file.dim,
                index_file.vectors.ncols()
            )));
        }
        if index_file.vectors.len_of(Axis(0)) != docs.len() {
            return Err(RagError::InvalidConfig(format!(
                "index holds {} vectors but sidecar holds {} documents",
                index_file.vectors.len_of(Axis(0)),
                docs.len()
            )));
        }

        debug!(target: "contest_rag::store", docs = docs.len(), dim = index_file.dim, "index loaded");
        Ok(FlatIndex {
            dim: index_file.dim,
            vectors: index_file.vectors,
            docs,
        })
    }
}

/// JSON lines, UTF-8, non-ASCII kept verbatim.
pub fn save_docs_jsonl<T: Serialize>(items: &[T], out_path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(out_path.as_ref())?);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn normalize(vector: ArrayView1<f32>) -> Array1<f32> {
    let norm = vector.dot(&vector).sqrt();
    if norm > 0.0 {
        vector.mapv(|x| x / norm)
    } else {
        vector.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    fn doc(id: &str) -> Document {
        Document::new(id, format!("[공모전명]: {id}"))
    }

    fn sample_index() -> FlatIndex {
        let mut index = FlatIndex::new(2);
        index.add(doc("east"), array![1.0, 0.0].view()).unwrap();
        index.add(doc("north"), array![0.0, 1.0].view()).unwrap();
        index.add(doc("north-east"), array![1.0, 1.0].view()).unwrap();
        index
    }

    #[test]
    fn search_ranks_by_cosine() {
        let index = sample_index();
        let hits = index.search(array![1.0, 0.1].view(), 3).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["east", "north-east", "north"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn search_truncates_to_top_k() {
        let index = sample_index();
        assert_eq!(index.search(array![1.0, 0.0].view(), 1).unwrap().len(), 1);
        assert_eq!(index.search(array![1.0, 0.0].view(), 10).unwrap().len(), 3);
        assert!(index.search(array![1.0, 0.0].view(), 0).unwrap().is_empty());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut index = FlatIndex::new(2);
        for id in ["first", "second", "third"] {
            index.add(doc(id), array![3.0, 4.0].view()).unwrap();
        }
        let hits = index.search(array![3.0, 4.0].view(), 3).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn add_rejects_wrong_width() {
        let mut index = FlatIndex::new(3);
        let err = index.add(doc("x"), array![1.0, 0.0].view()).unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 2, want: 3 }));
        assert!(index.is_empty());
    }

    #[test]
    fn save_and_load_preserve_docs_and_scores() -> Result<()> {
        let dir = tempdir()?;
        let index_path = dir.path().join("flat.index");
        let docs_path = dir.path().join("docs.jsonl");

        let index = sample_index();
        index.save(&index_path, &docs_path)?;
        let loaded = FlatIndex::load(&index_path, &docs_path)?;

        assert_eq!(loaded.dim(), 2);
        assert_eq!(loaded.len(), 3);
        let before = index.search(array![0.2, 1.0].view(), 3)?;
        let after = loaded.search(array![0.2, 1.0].view(), 3)?;
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.document, a.document);
            assert!((b.score - a.score).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn sidecar_keeps_korean_unescaped() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("docs.jsonl");
        save_docs_jsonl(&[doc("헬스케어")], &path)?;
        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.contains("[공모전명]: 헬스케어"));
        assert!(!raw.contains("\\u"));
        assert_eq!(raw.lines().count(), 1);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn save_reports_index_write_failure() -> Result<()> {
        let dir = tempdir()?;
        let docs_path = dir.path().join("docs.jsonl");

        // /dev/full accepts the open but fails every flush with ENOSPC.
        let err = sample_index().save("/dev/full", &docs_path).unwrap_err();
        assert!(matches!(err, RagError::Io(_) | RagError::Json(_)));
        assert!(!docs_path.exists());
        Ok(())
    }

    #[test]
    fn load_rejects_count_mismatch() -> Result<()> {
        let dir = tempdir()?;
        let index_path = dir.path().join("flat.index");
        let docs_path = dir.path().join("docs.jsonl");
        sample_index().save(&index_path, &docs_path)?;
        save_docs_jsonl(&[doc("only-one")], &docs_path)?;

        let err = FlatIndex::load(&index_path, &docs_path).unwrap_err();
        assert!(matches!(err, RagError::InvalidConfig(_)));
        Ok(())
    }
}
