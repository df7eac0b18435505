//! Feedback type definitions

use crate::scoring::ComplexityFactors;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome record for one completed task
///
/// Created once per completed task and immutable afterwards; each record
/// drives exactly one weight-update contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Decision this record reports on
    pub classification_id: Uuid,

    /// Observed task complexity, in [0.0, 1.0]
    pub actual_complexity: f64,

    /// Reported user satisfaction, in [0.0, 5.0]
    pub user_satisfaction: f64,

    /// Cost efficiency of the chosen path, in [0.0, 1.0]
    pub cost_efficiency: f64,

    /// Achieved output quality, in [0.0, 5.0]
    pub quality_achieved: f64,

    /// Wall-clock processing time, in milliseconds
    pub processing_time_ms: u64,

    /// Whether the complexity assessment was independently verified
    pub accuracy_verified: bool,
}

impl FeedbackRecord {
    /// Clip out-of-range values into their valid domains
    ///
    /// Returns the sanitized record plus a flag per clipped field. Records
    /// are corrected and kept rather than rejected, so the feedback stream
    /// keeps flowing.
    pub fn clipped(&self) -> (Self, Vec<AnomalyFlag>) {
        let mut flags = Vec::new();
        let mut clip = |field: &str, value: f64, lo: f64, hi: f64| {
            let clamped = if value.is_finite() {
                value.clamp(lo, hi)
            } else {
                lo
            };
            if clamped != value {
                flags.push(AnomalyFlag::ValueClipped {
                    field: field.to_string(),
                    original: value,
                    clipped: clamped,
                });
            }
            clamped
        };

        let sanitized = Self {
            classification_id: self.classification_id,
            actual_complexity: clip("actual_complexity", self.actual_complexity, 0.0, 1.0),
            user_satisfaction: clip("user_satisfaction", self.user_satisfaction, 0.0, 5.0),
            cost_efficiency: clip("cost_efficiency", self.cost_efficiency, 0.0, 1.0),
            quality_achieved: clip("quality_achieved", self.quality_achieved, 0.0, 5.0),
            processing_time_ms: self.processing_time_ms,
            accuracy_verified: self.accuracy_verified,
        };
        (sanitized, flags)
    }
}

/// Anomalies observed while ingesting feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyFlag {
    /// A record for this classification id was already accepted
    DuplicateSubmission,

    /// An out-of-range value was clipped into its valid domain
    ValueClipped {
        field: String,
        original: f64,
        clipped: f64,
    },

    /// The referenced classification id is unknown to the engine
    UnknownClassification,
}

/// Acknowledgement returned by `submit_feedback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAck {
    /// Whether the record entered the update stream
    pub accepted: bool,

    /// Anomalies observed during ingestion
    pub anomaly_flags: Vec<AnomalyFlag>,
}

/// A sanitized record joined with the decision it reports on
///
/// The weight updater needs the factors and predicted score behind the
/// original decision to compute a signed error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSample {
    /// Sanitized feedback record
    pub record: FeedbackRecord,

    /// Factor vector the decision was scored from
    pub factors: ComplexityFactors,

    /// Complexity score predicted at decision time
    pub predicted_score: f64,
}
