//! Complexity scoring type definitions

use crate::errors::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance for weight-sum validation
const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Five normalized complexity factors, each in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityFactors {
    /// Linguistic and structural complexity of the task content
    pub content_complexity: f64,

    /// Degree of specialist domain knowledge required
    pub domain_expertise_required: f64,

    /// Depth of research or information gathering required
    pub research_depth_required: f64,

    /// Amount of multi-step reasoning implied by the task
    pub multi_step_reasoning: f64,

    /// Gap between the task and readily available knowledge
    pub knowledge_gap: f64,
}

impl ComplexityFactors {
    /// Create a factor vector with every factor at the same level
    pub fn uniform(level: f64) -> Self {
        let level = level.clamp(0.0, 1.0);
        Self {
            content_complexity: level,
            domain_expertise_required: level,
            research_depth_required: level,
            multi_step_reasoning: level,
            knowledge_gap: level,
        }
    }

    /// Conservative default vector used when extraction degrades
    pub fn degraded_default() -> Self {
        Self::uniform(0.5)
    }

    /// Return a copy with every factor clamped into [0.0, 1.0]
    pub fn clamped(&self) -> Self {
        Self {
            content_complexity: self.content_complexity.clamp(0.0, 1.0),
            domain_expertise_required: self.domain_expertise_required.clamp(0.0, 1.0),
            research_depth_required: self.research_depth_required.clamp(0.0, 1.0),
            multi_step_reasoning: self.multi_step_reasoning.clamp(0.0, 1.0),
            knowledge_gap: self.knowledge_gap.clamp(0.0, 1.0),
        }
    }

    /// Factor values paired with their canonical names, in fixed order
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("content_complexity", self.content_complexity),
            ("domain_expertise_required", self.domain_expertise_required),
            ("research_depth_required", self.research_depth_required),
            ("multi_step_reasoning", self.multi_step_reasoning),
            ("knowledge_gap", self.knowledge_gap),
        ]
    }
}

/// Weight vector over the five complexity factors
///
/// Invariant: all weights non-negative and summing to exactly 1.0
/// (within floating-point tolerance), validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub content_complexity: f64,
    pub domain_expertise_required: f64,
    pub research_depth_required: f64,
    pub multi_step_reasoning: f64,
    pub knowledge_gap: f64,
}

impl FactorWeights {
    /// Create a validated weight vector
    pub fn new(
        content_complexity: f64,
        domain_expertise_required: f64,
        research_depth_required: f64,
        multi_step_reasoning: f64,
        knowledge_gap: f64,
    ) -> Result<Self> {
        let weights = Self {
            content_complexity,
            domain_expertise_required,
            research_depth_required,
            multi_step_reasoning,
            knowledge_gap,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Standard weights used at startup
    pub fn standard() -> Self {
        Self {
            content_complexity: 0.25,
            domain_expertise_required: 0.20,
            research_depth_required: 0.20,
            multi_step_reasoning: 0.20,
            knowledge_gap: 0.15,
        }
    }

    /// Validate the sum-to-one and non-negativity invariants
    pub fn validate(&self) -> Result<()> {
        for (name, w) in self.named() {
            if w < 0.0 {
                return Err(EngineError::InvalidThresholds(format!(
                    "negative weight {name}: {w}"
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(EngineError::InvalidWeights { sum });
        }
        Ok(())
    }

    /// Sum of all weights
    pub fn sum(&self) -> f64 {
        self.content_complexity
            + self.domain_expertise_required
            + self.research_depth_required
            + self.multi_step_reasoning
            + self.knowledge_gap
    }

    /// Weight values paired with their canonical names, in fixed order
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("content_complexity", self.content_complexity),
            ("domain_expertise_required", self.domain_expertise_required),
            ("research_depth_required", self.research_depth_required),
            ("multi_step_reasoning", self.multi_step_reasoning),
            ("knowledge_gap", self.knowledge_gap),
        ]
    }

    /// Rescale so the weights sum to exactly 1.0
    ///
    /// Used after bounded feedback adjustments, which can drift the sum.
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 {
            return Self::standard();
        }
        Self {
            content_complexity: self.content_complexity / sum,
            domain_expertise_required: self.domain_expertise_required / sum,
            research_depth_required: self.research_depth_required / sum,
            multi_step_reasoning: self.multi_step_reasoning / sum,
            knowledge_gap: self.knowledge_gap / sum,
        }
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self::standard()
    }
}

/// Immutable, versioned weight set
///
/// Decisions always run against one explicit version; the feedback loop
/// publishes a new version rather than mutating a live one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightVersion {
    /// Monotonically increasing version number
    pub version: u64,

    /// The validated weight vector
    pub weights: FactorWeights,

    /// When this version was published
    pub created_at: DateTime<Utc>,
}

impl WeightVersion {
    /// Version 1 with the standard startup weights
    pub fn initial() -> Self {
        Self {
            version: 1,
            weights: FactorWeights::standard(),
            created_at: Utc::now(),
        }
    }

    /// Publish a successor version with new weights
    pub fn successor(&self, weights: FactorWeights) -> Self {
        Self {
            version: self.version + 1,
            weights,
            created_at: Utc::now(),
        }
    }
}

/// Per-factor contribution to the aggregate score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    /// Canonical factor name
    pub factor: String,

    /// Normalized factor value in [0.0, 1.0]
    pub value: f64,

    /// Weight applied to this factor
    pub weight: f64,

    /// value * weight
    pub contribution: f64,
}

/// Aggregate complexity score with its audit breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityBreakdown {
    /// Scalar score in [0.0, 1.0]
    pub score: f64,

    /// Per-factor contributions, in canonical factor order
    pub contributions: Vec<FactorContribution>,

    /// Weight version the score was computed against
    pub weight_version: u64,
}
