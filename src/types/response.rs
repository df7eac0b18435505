//! Classification response contract

use crate::decision::{Classification, DecisionReasoning};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Downstream processing mode hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Single-pass, low-cost processing
    Fast,

    /// Multi-pass processing with research and verification
    Thorough,
}

/// Routing hint for the provider invocation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingInfo {
    /// Provider pool the decision routes to
    pub recommended_provider: String,

    /// Processing mode hint
    pub processing_mode: ProcessingMode,

    /// Estimated processing time, in milliseconds
    pub estimated_time_ms: u64,
}

/// Monitoring block for feedback and override consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringInfo {
    /// Unique decision identifier; feedback references this
    pub classification_id: Uuid,

    /// Whether a feedback record is expected for this decision
    pub feedback_required: bool,

    /// Whether a manual override could still change this routing
    pub override_available: bool,
}

/// Full classification response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    /// Routing classification
    pub classification: Classification,

    /// Decision confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Auditable reasoning trace
    pub reasoning: DecisionReasoning,

    /// Routing hint
    pub routing: RoutingInfo,

    /// Monitoring block
    pub monitoring: MonitoringInfo,
}
