//! Embedding providers.
//!
//! Every provider turns an ordered batch of strings into a matrix with one row
//! per input. The row width is fixed by the model identifier.

use std::hash::{Hash, Hasher};
use std::time::Duration;

use lazy_static::lazy_static;
use ndarray::{Array1, Array2};
use regex::Regex;
use rustc_hash::{FxHashSet, FxHasher};
use serde_json::Value;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::error::{RagError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_BATCH_SIZE: usize = 128;

pub trait Embedder {
    fn model(&self) -> &str;

    /// Width of the vectors this provider produces.
    fn dim(&self) -> usize;

    fn encode(&self, texts: &[String]) -> Result<Array2<f32>>;
}

/// Pick a provider for `model`.
///
/// `text-embedding-*` identifiers go to the OpenAI-compatible HTTP API
/// (`OPENAI_API_KEY`, optional `OPENAI_BASE_URL`); `hashing-<dim>` builds the
/// local feature-hashing provider.
pub fn resolve_embedder(model: &str) -> Result<Box<dyn Embedder>> {
    resolve_embedder_batched(model, DEFAULT_BATCH_SIZE)
}

/// [`resolve_embedder`] with an explicit request size for remote providers.
pub fn resolve_embedder_batched(model: &str, batch_size: usize) -> Result<Box<dyn Embedder>> {
    let model = model.trim();
    if let Some(dim) = remote_model_dim(model) {
        let embedder = OpenAiEmbedder::from_env(model, dim)?.with_batch_size(batch_size);
        return Ok(Box::new(embedder));
    }
    if let Some(raw) = model.strip_prefix("hashing-") {
        let dim = raw
            .parse::<usize>()
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| RagError::UnknownModel(model.to_string()))?;
        return Ok(Box::new(HashingEmbedder::new(dim)));
    }
    Err(RagError::UnknownModel(model.to_string()))
}

fn remote_model_dim(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

/// Deterministic offline embedder: hashed word and character-bigram counts,
/// L2-normalised.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    model: String,
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        HashingEmbedder {
            model: format!("hashing-{dim}"),
            dim,
        }
    }

    fn tokenize(text: &str) -> Vec<String> {
        lazy_static! {
            static ref STOP_WORDS: FxHashSet<&'static str> = {
                let words = vec![
                    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from",
                    "has", "he", "in", "is", "it", "its", "of", "on", "that", "the",
                    "to", "was", "were", "will", "with"
                ];
                words.into_iter().collect()
            };
            static ref PUNCT: Regex = Regex::new(r"[^\w\s]").expect("punctuation pattern compiles");
        }

        let text = text.nfc().collect::<String>().to_lowercase();
        let text = PUNCT.replace_all(&text, " ");

        text.split_whitespace()
            .filter(|&token| !STOP_WORDS.contains(token))
            .map(|token| token.to_string())
            .collect()
    }

    fn bucket(&self, feature: &str) -> usize {
        let mut hasher = FxHasher::default();
        feature.hash(&mut hasher);
        (hasher.finish() % self.dim as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Array1<f32> {
        let mut vector = Array1::<f32>::zeros(self.dim);

        for token in Self::tokenize(text) {
            vector[self.bucket(&token)] += 1.0;

            // Character bigrams let inflected Korean words share features.
            let chars: Vec<char> = token.chars().collect();
            for pair in chars.windows(2) {
                let bigram: String = pair.iter().collect();
                vector[self.bucket(&format!("#{bigram}"))] += 0.5;
            }
        }

        let norm = vector.dot(&vector).sqrt();
        if norm > 0.0 {
            vector /= norm;
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, texts: &[String]) -> Result<Array2<f32>> {
        let mut out = Array2::<f32>::zeros((texts.len(), self.dim));
        for (mut row, text) in out.rows_mut().into_iter().zip(texts) {
            row.assign(&self.embed_one(text));
        }
        Ok(out)
    }
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model: String,
    dim: usize,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn from_env(model: &str, dim: usize) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RagError::InvalidConfig("OPENAI_API_KEY is not set".into()))?;
        let api_base =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::new(api_base, api_key, model, dim)
    }

    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: &str,
        dim: usize,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(OpenAiEmbedder {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.to_string(),
            dim,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn request(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "input": batch,
        });
        let json: Value = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        parse_embedding_response(json)
    }
}

impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, texts: &[String]) -> Result<Array2<f32>> {
        let mut flat = Vec::with_capacity(texts.len() * self.dim);

        for batch in texts.chunks(self.batch_size) {
            let rows = self.request(batch)?;
            if rows.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    rows.len()
                )));
            }
            for row in rows {
                if row.len() != self.dim {
                    return Err(RagError::Embedding(format!(
                        "embedding dim {} != expected {} (model: {})",
                        row.len(),
                        self.dim,
                        self.model
                    )));
                }
                flat.extend(row);
            }
            debug!(target: "contest_rag::embedding", model = %self.model, batch = batch.len(), "embedded batch");
        }

        Ok(Array2::from_shape_vec((texts.len(), self.dim), flat)?)
    }
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| RagError::Embedding("response is missing data array".into()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| RagError::Embedding("item missing embedding array".into()))?;
        let mut vec = Vec::with_capacity(embedding.len());
        for value in embedding {
            let number = value
                .as_f64()
                .ok_or_else(|| RagError::Embedding("embedding value must be numeric".into()))?;
            vec.push(number as f32);
        }
        indexed.push((index, vec));
    }

    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
