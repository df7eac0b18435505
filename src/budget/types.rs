//! Budget system type definitions

use serde::{Deserialize, Serialize};

/// Configuration for the budget ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Daily cost budget, in dollars (default: 100.0)
    pub daily_budget: f64,

    /// Per-request cost ceiling, in dollars (default: 1.0)
    pub cost_per_request_limit: f64,

    /// Remaining fraction below which thresholds escalate (default: 0.2)
    pub escalation_fraction: f64,

    /// Default complexity threshold (default: 0.6)
    pub default_complexity_threshold: f64,

    /// Default quality threshold (default: 3.5)
    pub default_quality_threshold: f64,

    /// Escalated complexity threshold under cost pressure (default: 0.8)
    pub escalated_complexity_threshold: f64,

    /// Escalated quality threshold under cost pressure (default: 4.5)
    pub escalated_quality_threshold: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_budget: 100.0,
            cost_per_request_limit: 1.0,
            escalation_fraction: 0.2,
            default_complexity_threshold: 0.6,
            default_quality_threshold: 3.5,
            escalated_complexity_threshold: 0.8,
            escalated_quality_threshold: 4.5,
        }
    }
}

/// Which threshold pair is currently active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Normal operation: default thresholds
    Default,

    /// Budget pressure: escalated thresholds ("cost_override")
    CostOverride,
}

/// The active (complexity, quality) threshold pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveThresholds {
    pub complexity_threshold: f64,
    pub quality_threshold: f64,
    pub mode: ThresholdMode,
}

/// Point-in-time read of ledger state
///
/// Decisions consume snapshots only; the ledger is never locked for a read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// Daily budget, in dollars
    pub daily_budget: f64,

    /// Spend so far today, in dollars
    pub current_usage: f64,

    /// Remaining budget, in dollars; clamped at zero
    pub budget_remaining: f64,

    /// Per-request cost ceiling, in dollars
    pub cost_per_request_limit: f64,

    /// Active threshold pair at snapshot time
    pub thresholds: ActiveThresholds,
}

impl BudgetSnapshot {
    /// Remaining budget as a fraction of the daily budget
    pub fn remaining_fraction(&self) -> f64 {
        if self.daily_budget <= 0.0 {
            return 0.0;
        }
        (self.budget_remaining / self.daily_budget).clamp(0.0, 1.0)
    }

    /// Whether the budget is fully exhausted
    pub fn exhausted(&self) -> bool {
        self.budget_remaining <= 0.0
    }

    /// Whether the ledger is applying cost-override thresholds
    pub fn budget_limited(&self) -> bool {
        self.thresholds.mode == ThresholdMode::CostOverride
    }
}

/// Result of one spend attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendOutcome {
    /// Amount actually charged, in dollars (clamped at the remaining budget)
    pub charged: f64,

    /// Remaining budget after the spend, in dollars
    pub remaining_after: f64,

    /// True when the requested amount exceeded what was left
    pub clamped: bool,
}
