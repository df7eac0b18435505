//! Classification request contract
//!
//! Context keys form a closed, explicitly enumerated set; unrecognized
//! keys are rejected at deserialization rather than passed through untyped.

use crate::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Task urgency level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// Cost/quality trade-off preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreference {
    Cost,
    #[default]
    Balanced,
    Quality,
}

/// Recognized task context keys with documented defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskContext {
    /// Urgency of the task (default: medium)
    pub urgency: Urgency,

    /// Cost/quality preference (default: balanced)
    pub quality_preference: QualityPreference,

    /// Optional declared domain, e.g. "legal" or "medical"
    pub domain: Option<String>,

    /// Prior interaction identifiers for continuity
    pub previous_interactions: Vec<String>,
}

/// Hard constraints on task processing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskConstraints {
    /// Maximum spend for this task, in dollars
    pub max_cost: Option<f64>,

    /// Maximum processing time, in milliseconds
    pub max_time_ms: Option<u64>,

    /// Minimum acceptable quality/trust level, in [0.0, 5.0]
    pub quality_threshold: Option<f64>,
}

/// A request to classify one unit of work
///
/// Immutable once submitted; validation happens before extraction and a
/// failed validation performs no classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// Raw task text
    pub task_content: String,

    /// Verified caller identity (supplied by the auth layer)
    pub user_id: String,

    /// Recognized context keys
    #[serde(default)]
    pub context: TaskContext,

    /// Processing constraints
    #[serde(default)]
    pub constraints: TaskConstraints,
}

impl ClassificationRequest {
    /// Minimal request with default context and constraints
    pub fn new(task_content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            task_content: task_content.into(),
            user_id: user_id.into(),
            context: TaskContext::default(),
            constraints: TaskConstraints::default(),
        }
    }

    /// Validate the request before any extraction work
    pub fn validate(&self) -> Result<()> {
        if self.task_content.trim().is_empty() {
            return Err(EngineError::InvalidInput {
                field: "task_content".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.user_id.trim().is_empty() {
            return Err(EngineError::InvalidInput {
                field: "user_id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(threshold) = self.constraints.quality_threshold {
            if !(0.0..=5.0).contains(&threshold) {
                return Err(EngineError::InvalidInput {
                    field: "constraints.quality_threshold".to_string(),
                    reason: format!("{threshold} outside [0, 5]"),
                });
            }
        }
        if let Some(max_cost) = self.constraints.max_cost {
            if max_cost < 0.0 || !max_cost.is_finite() {
                return Err(EngineError::InvalidInput {
                    field: "constraints.max_cost".to_string(),
                    reason: format!("{max_cost} must be finite and non-negative"),
                });
            }
        }
        if let Some(max_time_ms) = self.constraints.max_time_ms {
            if max_time_ms == 0 {
                return Err(EngineError::InvalidInput {
                    field: "constraints.max_time_ms".to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}
