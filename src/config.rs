//! Per-request retrieval plan.
//!
//! A `Plan` is built once (defaults, environment, then CLI flags) and handed to
//! the agent by reference. Nothing mutates it afterwards.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Directory holding `flat.index` and `docs.jsonl`.
    pub index_dir: PathBuf,
    pub embedding_model: String,
    /// Number of neighbours fetched and averaged by the gate.
    pub top_k: usize,
    /// Bar for the best hit's similarity.
    pub min_score: f32,
    /// Bar for the mean similarity of the first `top_k` hits.
    pub min_mean_topk: f32,
    /// Character budget spent on titles in the drafted answer.
    pub max_context: usize,
    /// Draft an answer regardless of the gate.
    pub force_rag_only: bool,
    pub return_draft_when_enough: bool,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("indices/day5"),
            embedding_model: "text-embedding-3-small".to_string(),
            top_k: 5,
            min_score: 0.35,
            min_mean_topk: 0.30,
            max_context: 1500,
            force_rag_only: false,
            return_draft_when_enough: true,
        }
    }
}

impl Plan {
    /// Defaults overridden by `RAG_*` environment variables.
    ///
    /// - `RAG_INDEX_DIR`
    /// - `RAG_EMBEDDING_MODEL`
    /// - `RAG_TOP_K`
    /// - `RAG_MIN_SCORE`
    /// - `RAG_MIN_MEAN_TOPK`
    /// - `RAG_MAX_CONTEXT`
    /// - `RAG_FORCE_RAG_ONLY`
    /// - `RAG_RETURN_DRAFT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Plan::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Plan::default();
        let plan = Plan {
            index_dir: lookup("RAG_INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_dir),
            embedding_model: lookup("RAG_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            top_k: parse_var(&lookup, "RAG_TOP_K")?.unwrap_or(defaults.top_k),
            min_score: parse_var(&lookup, "RAG_MIN_SCORE")?.unwrap_or(defaults.min_score),
            min_mean_topk: parse_var(&lookup, "RAG_MIN_MEAN_TOPK")?
                .unwrap_or(defaults.min_mean_topk),
            max_context: parse_var(&lookup, "RAG_MAX_CONTEXT")?.unwrap_or(defaults.max_context),
            force_rag_only: parse_var(&lookup, "RAG_FORCE_RAG_ONLY")?
                .unwrap_or(defaults.force_rag_only),
            return_draft_when_enough: parse_var(&lookup, "RAG_RETURN_DRAFT")?
                .unwrap_or(defaults.return_draft_when_enough),
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::InvalidConfig("top_k must be > 0".into()));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(RagError::InvalidConfig(
                "embedding_model must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| RagError::InvalidConfig(format!("{key} = '{raw}'"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let plan = Plan::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(plan, Plan::default());
    }

    #[test]
    fn environment_overrides_fields() {
        let plan = Plan::from_lookup(lookup_from(&[
            ("RAG_INDEX_DIR", "/tmp/idx"),
            ("RAG_TOP_K", "3"),
            ("RAG_MIN_SCORE", "0.8"),
            ("RAG_FORCE_RAG_ONLY", "true"),
        ]))
        .unwrap();
        assert_eq!(plan.index_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(plan.top_k, 3);
        assert_eq!(plan.min_score, 0.8);
        assert!(plan.force_rag_only);
        assert_eq!(plan.max_context, Plan::default().max_context);
    }

    #[test]
    fn unparsable_value_is_rejected() {
        let err = Plan::from_lookup(lookup_from(&[("RAG_TOP_K", "many")])).unwrap_err();
        assert!(matches!(err, RagError::InvalidConfig(msg) if msg.contains("RAG_TOP_K")));
    }

    #[test]
    fn zero_top_k_is_invalid() {
        let plan = Plan {
            top_k: 0,
            ..Plan::default()
        };
        assert!(plan.validate().is_err());
    }
}
