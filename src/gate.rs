//! Retrieval confidence gate: is the retrieved context strong enough to answer from?

use serde::{Deserialize, Serialize};

use crate::document::ContextItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Enough,
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub status: GateStatus,
    pub top_score: f32,
    pub mean_topk: f32,
}

impl GateResult {
    pub fn is_enough(&self) -> bool {
        self.status == GateStatus::Enough
    }
}

/// Classifies `contexts` (sorted best first).
///
/// Passes only when the best score clears `min_score` *and* the mean of the
/// first `top_k` scores clears `min_mean_topk`. An empty list never passes and
/// reports both signals as `0.0`. A `top_k` of zero averages nothing: it never
/// passes and reports `mean_topk` as `0.0`.
pub fn evaluate(
    contexts: &[ContextItem],
    top_k: usize,
    min_score: f32,
    min_mean_topk: f32,
) -> GateResult {
    let Some(first) = contexts.first() else {
        return GateResult {
            status: GateStatus::Insufficient,
            top_score: 0.0,
            mean_topk: 0.0,
        };
    };

    let top_score = first.score;
    let head = &contexts[..top_k.min(contexts.len())];
    // A zero-width window has no mean and never passes.
    if head.is_empty() {
        return GateResult {
            status: GateStatus::Insufficient,
            top_score,
            mean_topk: 0.0,
        };
    }
    let mean_topk = head.iter().map(|c| c.score).sum::<f32>() / head.len() as f32;

    let status = if top_score >= min_score && mean_topk >= min_mean_topk {
        GateStatus::Enough
    } else {
        GateStatus::Insufficient
    };

    GateResult {
        status,
        top_score,
        mean_topk,
    }
}
