//! Trust scoring type definitions

use crate::errors::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance for weight-sum validation
const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Round to exactly two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Five observed trust components, each in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustComponents {
    /// Quality of the agent's responses
    pub response_quality: f64,

    /// Reported user satisfaction
    pub user_satisfaction: f64,

    /// Fraction of interactions completing successfully
    pub interaction_success: f64,

    /// Long-run reliability
    pub historical_reliability: f64,

    /// Alignment with expected tone and intent
    pub vibe_alignment: f64,
}

impl TrustComponents {
    /// Create a component vector with every component at the same level
    pub fn uniform(level: f64) -> Self {
        let level = level.clamp(0.0, 1.0);
        Self {
            response_quality: level,
            user_satisfaction: level,
            interaction_success: level,
            historical_reliability: level,
            vibe_alignment: level,
        }
    }

    /// Return a copy with every component clamped into [0.0, 1.0]
    pub fn clamped(&self) -> Self {
        Self {
            response_quality: self.response_quality.clamp(0.0, 1.0),
            user_satisfaction: self.user_satisfaction.clamp(0.0, 1.0),
            interaction_success: self.interaction_success.clamp(0.0, 1.0),
            historical_reliability: self.historical_reliability.clamp(0.0, 1.0),
            vibe_alignment: self.vibe_alignment.clamp(0.0, 1.0),
        }
    }
}

/// Weight vector over the five trust components
///
/// Invariant: non-negative, summing to exactly 1.0 (within tolerance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustWeights {
    pub response_quality: f64,
    pub user_satisfaction: f64,
    pub interaction_success: f64,
    pub historical_reliability: f64,
    pub vibe_alignment: f64,
}

impl TrustWeights {
    /// Fixed production weights: 30/25/20/15/10
    pub fn standard() -> Self {
        Self {
            response_quality: 0.30,
            user_satisfaction: 0.25,
            interaction_success: 0.20,
            historical_reliability: 0.15,
            vibe_alignment: 0.10,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(EngineError::InvalidWeights { sum });
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.response_quality
            + self.user_satisfaction
            + self.interaction_success
            + self.historical_reliability
            + self.vibe_alignment
    }

    /// Rescale so the weights sum to exactly 1.0
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 {
            return Self::standard();
        }
        Self {
            response_quality: self.response_quality / sum,
            user_satisfaction: self.user_satisfaction / sum,
            interaction_success: self.interaction_success / sum,
            historical_reliability: self.historical_reliability / sum,
            vibe_alignment: self.vibe_alignment / sum,
        }
    }

    /// Weighted aggregate of a component vector, scaled to [0.00, 5.00]
    /// and rounded to two decimals
    pub fn score(&self, components: &TrustComponents) -> f64 {
        let components = components.clamped();
        let weighted = self.response_quality * components.response_quality
            + self.user_satisfaction * components.user_satisfaction
            + self.interaction_success * components.interaction_success
            + self.historical_reliability * components.historical_reliability
            + self.vibe_alignment * components.vibe_alignment;
        round2((weighted * 5.0).clamp(0.0, 5.0))
    }
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self::standard()
    }
}

/// One append-only history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustSnapshot {
    /// Observed components behind this snapshot
    pub components: TrustComponents,

    /// Weighted value in [0.00, 5.00], two decimals
    pub value: f64,

    /// When the snapshot was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Current trust score for an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScore {
    /// Agent identity
    pub agent_id: String,

    /// Latest snapshot value in [0.00, 5.00], two decimals
    pub value: f64,

    /// Confidence in the value, in [0.0, 1.0]
    pub confidence: f64,

    /// Recent slope of the value over the trend window
    pub trend: f64,

    /// Number of snapshots behind this score
    pub sample_count: usize,

    /// Timestamp of the latest snapshot
    pub updated_at: DateTime<Utc>,

    /// Set when a persistence failure left this score possibly outdated
    pub stale: bool,
}

/// Trust scorer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Snapshots considered for the trend slope (default: 20)
    pub trend_window: usize,

    /// Sample-count offset in the confidence curve (default: 5.0)
    pub confidence_sample_offset: f64,

    /// Confidence ceiling (default: 0.95)
    pub confidence_cap: f64,

    /// Days of staleness that halve the time factor (default: 30.0)
    pub staleness_half_scale_days: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            trend_window: 20,
            confidence_sample_offset: 5.0,
            confidence_cap: 0.95,
            staleness_half_scale_days: 30.0,
        }
    }
}

impl TrustConfig {
    /// Confidence from sample count and data age
    ///
    /// `n / (n + offset)` rises monotonically with samples up to the cap;
    /// the time factor `1 / (1 + age/scale)` decays as data goes stale.
    pub fn confidence(&self, sample_count: usize, age_days: f64) -> f64 {
        let n = sample_count as f64;
        let sample_factor = (n / (n + self.confidence_sample_offset)).min(self.confidence_cap);
        let time_factor = 1.0 / (1.0 + age_days.max(0.0) / self.staleness_half_scale_days);
        (sample_factor * time_factor).clamp(0.0, 1.0)
    }
}
