use std::fs::{self, DirBuilder};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const INDEX_FILE: &str = "flat.index";
pub const DOCS_FILE: &str = "docs.jsonl";

/// Creates a directory if it doesn't exist
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .create(path)?;
    Ok(())
}

/// Locations of the vector matrix and the document sidecar inside `index_dir`.
pub fn index_paths(index_dir: impl AsRef<Path>) -> (PathBuf, PathBuf) {
    let dir = index_dir.as_ref();
    (dir.join(INDEX_FILE), dir.join(DOCS_FILE))
}

/// Splits text into chunks of approximately max_chars length at sentence boundaries
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current_chunk = String::new();
    let mut current_length = 0;

    // Simple sentence splitting on .!?
    for sentence in text.split(|c| c == '.' || c == '!' || c == '?') {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        let sentence_len = sentence.chars().count();
        if current_length + sentence_len + 2 > max_chars && !current_chunk.is_empty() {
            chunks.push(current_chunk.trim().to_string());
            current_chunk.clear();
            current_length = 0;
        }

        if !current_chunk.is_empty() {
            current_chunk.push(' ');
            current_length += 1;
        }
        current_chunk.push_str(sentence);
        current_chunk.push('.');
        current_length += sentence_len + 1;
    }

    if !current_chunk.is_empty() {
        chunks.push(current_chunk.trim().to_string());
    }

    chunks
}

/// Loads every `.txt` file under `dir_path`, recursively, as
/// `(path relative to dir_path, content)` pairs sorted by path.
pub fn load_text_files(dir_path: impl AsRef<Path>) -> Result<Vec<(PathBuf, String)>> {
    let root = dir_path.as_ref();
    let mut texts = Vec::new();
    collect_text_files(root, root, &mut texts)?;
    texts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(texts)
}

fn collect_text_files(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, String)>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if path.extension().is_some_and(|ext| ext == "txt") {
                let content = fs::read_to_string(&path)?;
                let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                out.push((relative, content));
            }
        } else if path.is_dir() {
            collect_text_files(root, &path, out)?;
        }
    }
    Ok(())
}
