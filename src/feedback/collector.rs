//! Feedback collector implementation
//!
//! Ingestion is idempotent per classification id: the first record wins,
//! later duplicates are no-ops. Out-of-range values are clipped and
//! flagged rather than dropped.

use crate::feedback::types::{AnomalyFlag, FeedbackAck, FeedbackRecord, FeedbackSample};
use crate::scoring::ComplexityFactors;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

/// Collector of outcome records awaiting a weight-update cycle
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    seen: Mutex<HashSet<Uuid>>,
    pending: Mutex<Vec<FeedbackSample>>,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one feedback record joined with its decision context
    ///
    /// Duplicates for an already-accepted classification id are rejected
    /// as no-ops with a `DuplicateSubmission` flag.
    pub fn ingest(
        &self,
        record: FeedbackRecord,
        factors: ComplexityFactors,
        predicted_score: f64,
    ) -> FeedbackAck {
        {
            let mut seen = self.seen.lock().unwrap();
            if !seen.insert(record.classification_id) {
                return FeedbackAck {
                    accepted: false,
                    anomaly_flags: vec![AnomalyFlag::DuplicateSubmission],
                };
            }
        }

        let (sanitized, anomaly_flags) = record.clipped();
        self.pending.lock().unwrap().push(FeedbackSample {
            record: sanitized,
            factors,
            predicted_score,
        });

        FeedbackAck {
            accepted: true,
            anomaly_flags,
        }
    }

    /// Drain the pending batch for one weight-update cycle
    pub fn drain_batch(&self) -> Vec<FeedbackSample> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }

    /// Number of records awaiting an update cycle
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Total distinct classification ids ever accepted
    pub fn accepted_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Whether a record for this classification id was already accepted
    pub fn was_accepted(&self, classification_id: &Uuid) -> bool {
        self.seen.lock().unwrap().contains(classification_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Uuid) -> FeedbackRecord {
        FeedbackRecord {
            classification_id: id,
            actual_complexity: 0.6,
            user_satisfaction: 4.0,
            cost_efficiency: 0.8,
            quality_achieved: 4.0,
            processing_time_ms: 900,
            accuracy_verified: true,
        }
    }

    #[test]
    fn test_first_submission_accepted() {
        let collector = FeedbackCollector::new();
        let ack = collector.ingest(record(Uuid::new_v4()), ComplexityFactors::uniform(0.6), 0.6);
        assert!(ack.accepted);
        assert!(ack.anomaly_flags.is_empty());
        assert_eq!(collector.pending_count(), 1);
    }

    #[test]
    fn test_duplicate_is_noop() {
        let collector = FeedbackCollector::new();
        let id = Uuid::new_v4();
        collector.ingest(record(id), ComplexityFactors::uniform(0.6), 0.6);
        let ack = collector.ingest(record(id), ComplexityFactors::uniform(0.6), 0.6);

        assert!(!ack.accepted);
        assert_eq!(ack.anomaly_flags, vec![AnomalyFlag::DuplicateSubmission]);
        assert_eq!(collector.pending_count(), 1);
    }

    #[test]
    fn test_was_accepted_tracks_seen_ids() {
        let collector = FeedbackCollector::new();
        let id = Uuid::new_v4();
        assert!(!collector.was_accepted(&id));
        collector.ingest(record(id), ComplexityFactors::uniform(0.6), 0.6);
        assert!(collector.was_accepted(&id));
        assert!(!collector.was_accepted(&Uuid::new_v4()));
    }

    #[test]
    fn test_clipped_record_still_accepted() {
        let collector = FeedbackCollector::new();
        let mut bad = record(Uuid::new_v4());
        bad.cost_efficiency = -2.0;

        let ack = collector.ingest(bad, ComplexityFactors::uniform(0.6), 0.6);
        assert!(ack.accepted);
        assert_eq!(ack.anomaly_flags.len(), 1);

        let batch = collector.drain_batch();
        assert_eq!(batch[0].record.cost_efficiency, 0.0);
    }

    #[test]
    fn test_drain_empties_pending() {
        let collector = FeedbackCollector::new();
        collector.ingest(record(Uuid::new_v4()), ComplexityFactors::uniform(0.5), 0.5);
        collector.ingest(record(Uuid::new_v4()), ComplexityFactors::uniform(0.7), 0.7);

        let batch = collector.drain_batch();
        assert_eq!(batch.len(), 2);
        assert_eq!(collector.pending_count(), 0);
        // Accepted ids are remembered across drains
        assert_eq!(collector.accepted_count(), 2);
    }
}
