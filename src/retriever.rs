//! Retrieval agent: acquire the index, retrieve, gate, and optionally draft an answer.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compose::draft_answer;
use crate::config::Plan;
use crate::document::ContextItem;
use crate::embedding::{Embedder, resolve_embedder};
use crate::error::{RagError, Result};
use crate::gate::{self, GateResult};
use crate::utils::index_paths;
use crate::vector_db::FlatIndex;

const PAYLOAD_TYPE: &str = "contest_recommendation";
const DIM_CHECK_TEXT: &str = "__dim_check__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    RagOnly,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub total_results: usize,
    /// Mean over every returned hit, not just the gate's top-k.
    pub avg_score: f32,
    pub search_method: SearchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub query: String,
    pub plan: Plan,
    pub contexts: Vec<ContextItem>,
    pub gating: GateResult,
    pub answer: String,
    pub stats: SearchStats,
}

/// Loads the index persisted in `index_dir` and checks that `embedder`
/// produces vectors of the width it was built with.
pub fn load_store(index_dir: impl AsRef<Path>, embedder: &dyn Embedder) -> Result<FlatIndex> {
    let index_dir = index_dir.as_ref();
    let (index_path, docs_path) = index_paths(index_dir);
    if !(index_path.exists() && docs_path.exists()) {
        return Err(RagError::IndexNotFound {
            dir: index_dir.to_path_buf(),
        });
    }
    let store = FlatIndex::load(&index_path, &docs_path)?;

    let embedder_dim = embedder.encode(&[DIM_CHECK_TEXT.to_string()])?.ncols();
    if store.dim() != embedder_dim {
        return Err(RagError::DimensionMismatch {
            index: store.dim(),
            embedder: embedder_dim,
        });
    }
    Ok(store)
}

pub struct RetrievalAgent {
    plan_defaults: Plan,
}

impl Default for RetrievalAgent {
    fn default() -> Self {
        Self::new(Plan::default())
    }
}

impl RetrievalAgent {
    pub fn new(plan_defaults: Plan) -> Self {
        RetrievalAgent { plan_defaults }
    }

    pub fn plan_defaults(&self) -> &Plan {
        &self.plan_defaults
    }

    /// Answers `query` with `plan`, or the agent's defaults when `plan` is `None`.
    pub fn handle(&self, query: &str, plan: Option<&Plan>) -> Result<ResponsePayload> {
        let plan = plan.unwrap_or(&self.plan_defaults);
        let embedder = resolve_embedder(&plan.embedding_model)?;
        self.handle_with(query, plan, embedder.as_ref())
    }

    /// Same as [`RetrievalAgent::handle`] with a caller-supplied embedding provider.
    pub fn handle_with(
        &self,
        query: &str,
        plan: &Plan,
        embedder: &dyn Embedder,
    ) -> Result<ResponsePayload> {
        plan.validate()?;
        info!(
            target: "contest_rag::agent",
            query,
            model = embedder.model(),
            index_dir = %plan.index_dir.display(),
            "handle: start"
        );

        let store = load_store(&plan.index_dir, embedder)?;

        let query_vecs = embedder.encode(&[query.to_string()])?;
        if query_vecs.nrows() == 0 {
            return Err(RagError::Embedding("empty embedding response".into()));
        }
        let contexts = store.search(query_vecs.row(0), plan.top_k)?;

        let gating = gate::evaluate(&contexts, plan.top_k, plan.min_score, plan.min_mean_topk);
        debug!(
            target: "contest_rag::agent",
            hits = contexts.len(),
            top_score = gating.top_score,
            mean_topk = gating.mean_topk,
            status = ?gating.status,
            "gate evaluated"
        );

        let answer = if plan.force_rag_only || (gating.is_enough() && plan.return_draft_when_enough)
        {
            draft_answer(query, &contexts, plan.max_context)
        } else {
            String::new()
        };

        let avg_score = if contexts.is_empty() {
            0.0
        } else {
            contexts.iter().map(|c| c.score).sum::<f32>() / contexts.len() as f32
        };
        let stats = SearchStats {
            total_results: contexts.len(),
            avg_score,
            search_method: if plan.force_rag_only {
                SearchMode::RagOnly
            } else {
                SearchMode::Hybrid
            },
        };

        info!(
            target: "contest_rag::agent",
            hits = stats.total_results,
            status = ?gating.status,
            answered = !answer.is_empty(),
            "handle: finished"
        );

        Ok(ResponsePayload {
            kind: PAYLOAD_TYPE.to_string(),
            query: query.to_string(),
            plan: plan.clone(),
            contexts,
            gating,
            answer,
            stats,
        })
    }
}
