//! Telemetry for the classification engine
//!
//! Provides in-process event collection and aggregate statistics for
//! dashboards and audit consumers.

use crate::decision::Classification;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    // Decision events
    ClassificationMade {
        classification: Classification,
        complexity_score: f64,
        confidence: f64,
        timestamp: Instant,
    },
    ExtractionDegraded {
        timestamp: Instant,
    },
    OverrideApplied {
        reason: String,
        timestamp: Instant,
    },
    OverrideSuperseded {
        reason: String,
        timestamp: Instant,
    },

    // Budget events
    ThresholdEscalated {
        remaining_fraction: f64,
        timestamp: Instant,
    },
    ThresholdReverted {
        remaining_fraction: f64,
        timestamp: Instant,
    },
    BudgetExhausted {
        timestamp: Instant,
    },

    // Feedback events
    FeedbackAnomaly {
        classification_id: String,
        detail: String,
        timestamp: Instant,
    },
    WeightsPublished {
        version: u64,
        batch_size: usize,
        timestamp: Instant,
    },
    TrustMarkedStale {
        agent_id: String,
        timestamp: Instant,
    },
}

/// Aggregate statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub classifications_basic: usize,
    pub classifications_complex: usize,
    pub degraded_extractions: usize,
    pub overrides_applied: usize,
    pub overrides_superseded: usize,
    pub threshold_escalations: usize,
    pub threshold_reversions: usize,
    pub budget_exhaustions: usize,
    pub feedback_anomalies: usize,
    pub weight_publications: usize,
    pub stale_trust_marks: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = self.stats.lock().unwrap();
            match &event {
                TelemetryEvent::ClassificationMade { classification, .. } => {
                    match classification {
                        Classification::Basic => stats.classifications_basic += 1,
                        Classification::Complex => stats.classifications_complex += 1,
                    }
                }
                TelemetryEvent::ExtractionDegraded { .. } => {
                    stats.degraded_extractions += 1;
                }
                TelemetryEvent::OverrideApplied { .. } => {
                    stats.overrides_applied += 1;
                }
                TelemetryEvent::OverrideSuperseded { .. } => {
                    stats.overrides_superseded += 1;
                }
                TelemetryEvent::ThresholdEscalated { .. } => {
                    stats.threshold_escalations += 1;
                }
                TelemetryEvent::ThresholdReverted { .. } => {
                    stats.threshold_reversions += 1;
                }
                TelemetryEvent::BudgetExhausted { .. } => {
                    stats.budget_exhaustions += 1;
                }
                TelemetryEvent::FeedbackAnomaly { .. } => {
                    stats.feedback_anomalies += 1;
                }
                TelemetryEvent::WeightsPublished { .. } => {
                    stats.weight_publications += 1;
                }
                TelemetryEvent::TrustMarkedStale { .. } => {
                    stats.stale_trust_marks += 1;
                }
            }
        }

        self.events.lock().unwrap().push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.stats.lock().unwrap().clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = self.events.lock().unwrap();
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Fraction of classifications routed to the complex path
    pub fn complex_rate(&self) -> f64 {
        let stats = self.stats.lock().unwrap();
        let total = stats.classifications_basic + stats.classifications_complex;
        if total == 0 {
            0.0
        } else {
            stats.classifications_complex as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
