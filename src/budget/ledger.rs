//! Budget ledger implementation
//!
//! The single owner of the spend counter and the threshold-mode flag.
//! Spends go through one compare-and-swap path that clamps at zero and
//! never blocks; decision reads are lock-free snapshots.

use crate::budget::types::{
    ActiveThresholds, BudgetConfig, BudgetSnapshot, SpendOutcome, ThresholdMode,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Conversion factor between dollars and the integer micro-dollar counter
const MICROS_PER_DOLLAR: f64 = 1_000_000.0;

fn to_micros(dollars: f64) -> u64 {
    (dollars.max(0.0) * MICROS_PER_DOLLAR).round() as u64
}

fn to_dollars(micros: u64) -> f64 {
    micros as f64 / MICROS_PER_DOLLAR
}

/// Persistable ledger state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub daily_budget: f64,
    pub current_usage: f64,
}

/// Cost budget ledger with adaptive thresholds
#[derive(Debug)]
pub struct BudgetLedger {
    config: BudgetConfig,

    /// Daily budget in micro-dollars
    budget_micros: u64,

    /// Spend counter in micro-dollars; mutated only via CAS
    used_micros: AtomicU64,

    /// True while escalated (cost_override) thresholds are active
    cost_override: AtomicBool,
}

impl BudgetLedger {
    /// Create a ledger with default configuration
    pub fn new() -> Self {
        Self::with_config(BudgetConfig::default())
    }

    /// Create a ledger with custom configuration
    pub fn with_config(config: BudgetConfig) -> Self {
        let budget_micros = to_micros(config.daily_budget);
        Self {
            config,
            budget_micros,
            used_micros: AtomicU64::new(0),
            cost_override: AtomicBool::new(false),
        }
    }

    /// Restore a ledger from persisted state
    pub fn from_state(config: BudgetConfig, state: &LedgerState) -> Self {
        let ledger = Self::with_config(BudgetConfig {
            daily_budget: state.daily_budget,
            ..config
        });
        ledger
            .used_micros
            .store(to_micros(state.current_usage).min(ledger.budget_micros), Ordering::SeqCst);
        ledger.refresh_mode();
        ledger
    }

    /// Extract persistable state
    pub fn to_state(&self) -> LedgerState {
        LedgerState {
            daily_budget: to_dollars(self.budget_micros),
            current_usage: to_dollars(self.used_micros.load(Ordering::SeqCst)),
        }
    }

    /// Ledger configuration
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Attempt to spend `amount` dollars
    ///
    /// Atomic: concurrent spends never lose updates and the counter never
    /// exceeds the daily budget. A spend against an exhausted budget is
    /// clamped to zero rather than failing or blocking.
    pub fn spend(&self, amount: f64) -> SpendOutcome {
        let amount_micros = to_micros(amount);
        let budget = self.budget_micros;

        let mut charged_micros = 0;
        let update = self
            .used_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                let new_used = used.saturating_add(amount_micros).min(budget);
                charged_micros = new_used - used;
                Some(new_used)
            });

        // fetch_update with a Some-returning closure cannot fail
        let _ = update;

        self.refresh_mode();

        let remaining = budget.saturating_sub(self.used_micros.load(Ordering::SeqCst));
        SpendOutcome {
            charged: to_dollars(charged_micros),
            remaining_after: to_dollars(remaining),
            clamped: charged_micros < amount_micros,
        }
    }

    /// Remaining budget in dollars
    pub fn remaining(&self) -> f64 {
        let used = self.used_micros.load(Ordering::SeqCst);
        to_dollars(self.budget_micros.saturating_sub(used))
    }

    /// Remaining budget as a fraction of the daily budget
    pub fn remaining_fraction(&self) -> f64 {
        if self.budget_micros == 0 {
            return 0.0;
        }
        let used = self.used_micros.load(Ordering::SeqCst);
        self.budget_micros.saturating_sub(used) as f64 / self.budget_micros as f64
    }

    /// Current threshold mode
    pub fn mode(&self) -> ThresholdMode {
        if self.cost_override.load(Ordering::SeqCst) {
            ThresholdMode::CostOverride
        } else {
            ThresholdMode::Default
        }
    }

    /// Active threshold pair for the current mode
    pub fn active_thresholds(&self) -> ActiveThresholds {
        match self.mode() {
            ThresholdMode::Default => ActiveThresholds {
                complexity_threshold: self.config.default_complexity_threshold,
                quality_threshold: self.config.default_quality_threshold,
                mode: ThresholdMode::Default,
            },
            ThresholdMode::CostOverride => ActiveThresholds {
                complexity_threshold: self.config.escalated_complexity_threshold,
                quality_threshold: self.config.escalated_quality_threshold,
                mode: ThresholdMode::CostOverride,
            },
        }
    }

    /// Point-in-time snapshot for a decision
    pub fn snapshot(&self) -> BudgetSnapshot {
        let used = self.used_micros.load(Ordering::SeqCst);
        BudgetSnapshot {
            daily_budget: to_dollars(self.budget_micros),
            current_usage: to_dollars(used),
            budget_remaining: to_dollars(self.budget_micros.saturating_sub(used)),
            cost_per_request_limit: self.config.cost_per_request_limit,
            thresholds: self.active_thresholds(),
        }
    }

    /// Apply persisted usage to this ledger
    ///
    /// Used at startup to resume a budget day; the configured daily
    /// budget stays authoritative and usage is clamped to it.
    pub fn apply_usage(&self, state: &LedgerState) {
        self.used_micros.store(
            to_micros(state.current_usage).min(self.budget_micros),
            Ordering::SeqCst,
        );
        self.refresh_mode();
    }

    /// Reset the spend counter for a new budget day
    pub fn reset_day(&self) {
        self.used_micros.store(0, Ordering::SeqCst);
        self.refresh_mode();
    }

    /// Re-evaluate the threshold mode from the remaining fraction
    ///
    /// Escalates below the configured fraction, reverts once it recovers.
    fn refresh_mode(&self) {
        let limited = self.remaining_fraction() < self.config.escalation_fraction;
        self.cost_override.store(limited, Ordering::SeqCst);
    }
}

impl Default for BudgetLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_state() {
        let ledger = BudgetLedger::new();
        assert_eq!(ledger.remaining(), 100.0);
        assert_eq!(ledger.mode(), ThresholdMode::Default);
        let thresholds = ledger.active_thresholds();
        assert_eq!(thresholds.complexity_threshold, 0.6);
        assert_eq!(thresholds.quality_threshold, 3.5);
    }

    #[test]
    fn test_spend_decrements_remaining() {
        let ledger = BudgetLedger::new();
        let outcome = ledger.spend(30.0);
        assert_eq!(outcome.charged, 30.0);
        assert!(!outcome.clamped);
        assert_eq!(ledger.remaining(), 70.0);
    }

    #[test]
    fn test_spend_clamps_at_zero() {
        let ledger = BudgetLedger::with_config(BudgetConfig {
            daily_budget: 10.0,
            ..BudgetConfig::default()
        });
        let outcome = ledger.spend(25.0);
        assert_eq!(outcome.charged, 10.0);
        assert!(outcome.clamped);
        assert_eq!(ledger.remaining(), 0.0);

        // Further spends charge nothing and never go negative
        let outcome = ledger.spend(5.0);
        assert_eq!(outcome.charged, 0.0);
        assert!(outcome.clamped);
        assert_eq!(ledger.remaining(), 0.0);
    }

    #[test]
    fn test_threshold_escalation_below_fraction() {
        let ledger = BudgetLedger::new();
        ledger.spend(85.0); // remaining fraction 0.15 < 0.2
        assert_eq!(ledger.mode(), ThresholdMode::CostOverride);
        let thresholds = ledger.active_thresholds();
        assert_eq!(thresholds.complexity_threshold, 0.8);
        assert_eq!(thresholds.quality_threshold, 4.5);
    }

    #[test]
    fn test_threshold_reverts_after_reset() {
        let ledger = BudgetLedger::new();
        ledger.spend(90.0);
        assert_eq!(ledger.mode(), ThresholdMode::CostOverride);
        ledger.reset_day();
        assert_eq!(ledger.mode(), ThresholdMode::Default);
        assert_eq!(ledger.remaining(), 100.0);
    }

    #[test]
    fn test_snapshot_consistency() {
        let ledger = BudgetLedger::new();
        ledger.spend(40.0);
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.current_usage, 40.0);
        assert_eq!(snapshot.budget_remaining, 60.0);
        assert!((snapshot.remaining_fraction() - 0.6).abs() < 1e-9);
        assert!(!snapshot.exhausted());
        assert!(!snapshot.budget_limited());
    }

    #[test]
    fn test_state_roundtrip() {
        let ledger = BudgetLedger::new();
        ledger.spend(35.5);
        let state = ledger.to_state();
        let restored = BudgetLedger::from_state(BudgetConfig::default(), &state);
        assert!((restored.remaining() - ledger.remaining()).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_spends_never_negative() {
        let ledger = Arc::new(BudgetLedger::with_config(BudgetConfig {
            daily_budget: 50.0,
            ..BudgetConfig::default()
        }));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = Arc::clone(&ledger);
            handles.push(std::thread::spawn(move || {
                for _ in 0..10 {
                    ledger.spend(0.5);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // 200 spends of 0.5 against 50.0: exactly exhausted
        assert_eq!(ledger.remaining(), 0.0);
        assert!(ledger.snapshot().exhausted());
    }
}
