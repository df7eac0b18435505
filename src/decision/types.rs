//! Decision engine type definitions

use crate::errors::{EngineError, Result};
use crate::scoring::FactorContribution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The binary routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Cheap, fast processing path
    Basic,

    /// Elevated-capability processing path
    Complex,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Basic => "basic",
            Classification::Complex => "complex",
        }
    }
}

/// Which precedence rule produced the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// Rule 1: manual override applied
    Override,

    /// Rule 2: hard complexity floor (absolute)
    HardComplexityFloor,

    /// Budget fully exhausted: forced basic
    BudgetExhausted,

    /// Rule 3: high-trust escalation at moderate complexity
    TrustEscalation,

    /// Rule 4: cost-override mode forcing the cheaper path
    BudgetRelief,

    /// Rule 5: dynamic complexity threshold crossed
    DynamicThreshold,

    /// Rule 6: default basic
    Default,
}

/// Versioned, immutable decision rule constants
///
/// Passed explicitly into `classify()` so threshold changes are
/// reproducible across versions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// Configuration version
    pub version: u64,

    /// Rule 2: scores at or above this are always complex (default: 0.7)
    pub hard_complexity_floor: f64,

    /// Rule 3: trust threshold that triggers escalation (default: 4.0)
    pub trust_escalation_threshold: f64,

    /// Rule 3: minimum complexity for trust escalation (default: 0.4)
    pub trust_escalation_min_complexity: f64,

    /// Rule 4: cost-override relief only applies below this score (default: 0.8)
    pub budget_relief_ceiling: f64,
}

impl DecisionThresholds {
    pub fn validate(&self) -> Result<()> {
        let bounded = [
            ("hard_complexity_floor", self.hard_complexity_floor),
            (
                "trust_escalation_min_complexity",
                self.trust_escalation_min_complexity,
            ),
            ("budget_relief_ceiling", self.budget_relief_ceiling),
        ];
        for (name, value) in bounded {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidThresholds(format!(
                    "{name} = {value} outside [0, 1]"
                )));
            }
        }
        if !(0.0..=5.0).contains(&self.trust_escalation_threshold) {
            return Err(EngineError::InvalidThresholds(format!(
                "trust_escalation_threshold = {} outside [0, 5]",
                self.trust_escalation_threshold
            )));
        }
        Ok(())
    }
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            version: 1,
            hard_complexity_floor: 0.7,
            trust_escalation_threshold: 4.0,
            trust_escalation_min_complexity: 0.4,
            budget_relief_ceiling: 0.8,
        }
    }
}

/// Quality requirements derived from request constraints and agent trust
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityRequirements {
    /// Minimum trust level demanded by the caller, in [0.0, 5.0]
    pub trust_level_threshold: f64,
}

/// Manual override directive
///
/// Lifecycle: created, active until `expires_at`, then expired or
/// superseded by a more recently authorized override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualOverride {
    /// Override behavior
    #[serde(flatten)]
    pub override_type: OverrideType,

    /// Human-readable justification
    pub reason: String,

    /// Who authorized this override
    pub authorized_by: String,

    /// When it was authorized; the most recent authorization wins conflicts
    pub authorized_at: DateTime<Utc>,

    /// Expiry instant
    pub expires_at: DateTime<Utc>,

    /// Whether the cost impact was approved
    pub cost_approved: bool,

    /// Restrict to one user scope; `None` applies engine-wide
    pub user_id: Option<String>,
}

/// Override behavior variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverrideType {
    /// Force the basic path
    ForceBasic,

    /// Force the complex path
    ForceComplex,

    /// Substitute a custom complexity threshold for rule 5
    CustomThreshold { complexity_threshold: f64 },
}

impl ManualOverride {
    /// Whether the override is active at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether the override applies to `user_id`
    pub fn applies_to(&self, user_id: &str) -> bool {
        match &self.user_id {
            Some(scoped) => scoped == user_id,
            None => true,
        }
    }
}

/// Acknowledgement returned by `apply_override`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideAck {
    pub accepted: bool,
    pub expires_at: DateTime<Utc>,
}

/// Auditable reasoning trace behind a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReasoning {
    /// Aggregate complexity score in [0.0, 1.0]
    pub complexity_score: f64,

    /// Per-factor contribution breakdown
    pub factors: Vec<FactorContribution>,

    /// Estimated processing cost, in dollars
    pub cost_estimate: f64,

    /// Predicted output quality, in [0.0, 5.0]
    pub quality_prediction: f64,

    /// Rule that produced the classification
    pub rule: DecisionRule,

    /// Free-form annotations (budget exhaustion, degradation, ...)
    pub notes: Vec<String>,
}

/// The classification decision emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDecision {
    /// Routing classification
    pub classification: Classification,

    /// Decision confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Auditable reasoning trace
    pub reasoning: DecisionReasoning,

    /// Unique decision identifier
    pub classification_id: Uuid,

    /// Reason string of the applied override, when one was applied
    pub override_applied: Option<String>,
}
