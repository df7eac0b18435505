//! Cost budget ledger and adaptive threshold management
//! Single owner of budget counters and threshold-adaptation state

pub mod ledger;
pub mod types;

pub use ledger::{BudgetLedger, LedgerState};
pub use types::{ActiveThresholds, BudgetConfig, BudgetSnapshot, SpendOutcome, ThresholdMode};
