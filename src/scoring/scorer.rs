//! Complexity scorer implementation
//!
//! Pure weighted aggregation with mathematical guarantees:
//! - Bounded output: [0.0, 1.0]
//! - Monotonic: higher factor values never lower the score
//! - Auditable: per-factor contributions always retained

use crate::scoring::types::{
    ComplexityBreakdown, ComplexityFactors, FactorContribution, WeightVersion,
};

/// Complexity scorer bound to one immutable weight version
#[derive(Debug, Clone)]
pub struct ComplexityScorer {
    weights: WeightVersion,
}

impl ComplexityScorer {
    /// Create a scorer against an explicit weight version
    pub fn new(weights: WeightVersion) -> Self {
        Self { weights }
    }

    /// The weight version this scorer computes against
    pub fn weight_version(&self) -> &WeightVersion {
        &self.weights
    }

    /// Compute the aggregate score with per-factor breakdown
    ///
    /// Formula: score = Σ(factor_i × weight_i)
    ///
    /// Pure function of (factors, weights); input factors are clamped
    /// into [0.0, 1.0] before weighting.
    pub fn score(&self, factors: &ComplexityFactors) -> ComplexityBreakdown {
        let factors = factors.clamped();
        let factor_values = factors.named();
        let weight_values = self.weights.weights.named();

        let mut contributions = Vec::with_capacity(factor_values.len());
        let mut score = 0.0;

        for ((name, value), (_, weight)) in factor_values.iter().zip(weight_values.iter()) {
            let contribution = value * weight;
            score += contribution;
            contributions.push(FactorContribution {
                factor: (*name).to_string(),
                value: *value,
                weight: *weight,
                contribution,
            });
        }

        ComplexityBreakdown {
            score: score.clamp(0.0, 1.0),
            contributions,
            weight_version: self.weights.version,
        }
    }
}

impl Default for ComplexityScorer {
    fn default() -> Self {
        Self::new(WeightVersion::initial())
    }
}
