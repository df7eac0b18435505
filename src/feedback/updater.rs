//! Weight update rules
//!
//! Pure functions `(old_weights, feedback_batch) -> new_weights` with a
//! bounded per-weight step, so every published weight version is
//! replayable from the batches that produced it.

use crate::feedback::types::FeedbackSample;
use crate::scoring::{FactorWeights, WeightVersion};
use crate::trust::TrustWeights;
use serde::{Deserialize, Serialize};

/// Update-rule parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateParams {
    /// Step scale applied to the mean prediction error (default: 0.1)
    pub learning_rate: f64,

    /// Per-weight cap on one update cycle's movement (default: 0.05)
    pub max_step: f64,

    /// Floor preventing any weight from collapsing to zero (default: 0.02)
    pub min_weight: f64,
}

impl Default for UpdateParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_step: 0.05,
            min_weight: 0.02,
        }
    }
}

/// Recompute complexity factor weights from a feedback batch
///
/// For each sample the signed prediction error (`actual − predicted`)
/// shifts weight toward factors that were above the sample's mean factor
/// level when the engine underestimated, and away when it overestimated.
/// Every per-weight delta is capped, weights are floored, and the result
/// is renormalized to sum 1.0. An empty batch republishes the old weights
/// unchanged as a new version.
pub fn update_factor_weights(
    old: &WeightVersion,
    batch: &[FeedbackSample],
    params: &UpdateParams,
) -> WeightVersion {
    if batch.is_empty() {
        return old.successor(old.weights);
    }

    let mut deltas = [0.0f64; 5];
    for sample in batch {
        let error = sample.record.actual_complexity - sample.predicted_score;
        let factors = sample.factors.clamped();
        let values = factors.named();
        let mean = values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64;

        for (i, (_, value)) in values.iter().enumerate() {
            deltas[i] += params.learning_rate * error * (value - mean);
        }
    }

    let n = batch.len() as f64;
    let old_values = old.weights.named();
    let mut adjusted = [0.0f64; 5];
    for (i, (_, weight)) in old_values.iter().enumerate() {
        let step = (deltas[i] / n).clamp(-params.max_step, params.max_step);
        adjusted[i] = (weight + step).max(params.min_weight);
    }

    let weights = FactorWeights {
        content_complexity: adjusted[0],
        domain_expertise_required: adjusted[1],
        research_depth_required: adjusted[2],
        multi_step_reasoning: adjusted[3],
        knowledge_gap: adjusted[4],
    }
    .normalized();

    old.successor(weights)
}

/// Recompute trust component weights from a feedback batch
///
/// When reported satisfaction diverges from achieved quality (in either
/// direction), the `user_satisfaction` component carries information the
/// quality signal does not, and gains weight at `response_quality`'s
/// expense. The movement is capped and the result renormalized.
pub fn update_trust_weights(
    old: &TrustWeights,
    batch: &[FeedbackSample],
    params: &UpdateParams,
) -> TrustWeights {
    if batch.is_empty() {
        return *old;
    }

    let mean_divergence = batch
        .iter()
        .map(|s| (s.record.user_satisfaction - s.record.quality_achieved) / 5.0)
        .sum::<f64>()
        / batch.len() as f64;

    if mean_divergence.abs() <= 0.05 {
        return *old;
    }

    let shift = (params.learning_rate * mean_divergence.abs()).min(params.max_step);
    TrustWeights {
        response_quality: (old.response_quality - shift).max(params.min_weight),
        user_satisfaction: (old.user_satisfaction + shift).max(params.min_weight),
        ..*old
    }
    .normalized()
}
