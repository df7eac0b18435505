//! Classification engine orchestration
//!
//! Wires the feature extractor, complexity scorer, trust tracker, budget
//! ledger, override registry, and feedback loop behind the four public
//! operations: classify, submit_feedback, get_trust_score, apply_override.
//!
//! Concurrency model: every classify() call runs against read-only
//! snapshots of weights and thresholds and needs no locking. The only
//! shared writers are the ledger's CAS spend path and the per-agent
//! trust mutexes.

use crate::budget::{BudgetLedger, ThresholdMode};
use crate::config::EngineConfig;
use crate::decision::{
    classify, Classification, DecisionInputs, ManualOverride, OverrideAck, OverrideRegistry,
    QualityRequirements,
};
use crate::errors::Result;
use crate::extraction::{ExtractorConfig, FeatureExtractor, HttpNluClient};
use crate::feedback::{
    update_factor_weights, update_trust_weights, AnomalyFlag, FeedbackAck, FeedbackCollector,
    FeedbackRecord,
};
use crate::persistence::{with_retries, StateStore};
use crate::scoring::{ComplexityFactors, ComplexityScorer, WeightVersion};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::trust::{TrustComponents, TrustScore, TrustTracker};
use crate::types::{
    ClassificationRequest, ClassificationResponse, MonitoringInfo, ProcessingMode,
    QualityPreference, RoutingInfo,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use uuid::Uuid;

/// Decision context retained for the feedback join
#[derive(Debug, Clone)]
struct PendingDecision {
    user_id: String,
    factors: ComplexityFactors,
    predicted_score: f64,
}

/// The task classification and trust-scoring engine
pub struct ClassificationEngine {
    config: EngineConfig,
    extractor: FeatureExtractor,

    /// Active weight version; decisions clone the Arc and never observe
    /// a partially updated set
    weights: RwLock<Arc<WeightVersion>>,

    trust: TrustTracker,
    ledger: BudgetLedger,
    overrides: OverrideRegistry,
    collector: FeedbackCollector,
    telemetry: TelemetryCollector,
    store: Option<Arc<dyn StateStore>>,

    /// classification_id -> decision context awaiting feedback; entries
    /// are consumed when their feedback is accepted
    pending: Mutex<HashMap<Uuid, PendingDecision>>,

    /// Serializes drain-compute-publish so concurrent feedback cannot
    /// lose a batch or duplicate a version number
    update_cycle: Mutex<()>,
}

impl ClassificationEngine {
    /// Create an engine from validated configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut extractor = FeatureExtractor::with_config(ExtractorConfig {
            nlu_timeout_ms: config.extraction.nlu_timeout_ms,
        });
        if let Some(endpoint) = &config.extraction.nlu_endpoint {
            extractor = extractor.with_nlu(Arc::new(HttpNluClient::new(endpoint.clone())));
        }

        Ok(Self {
            extractor,
            weights: RwLock::new(Arc::new(WeightVersion::initial())),
            trust: TrustTracker::with_config(config.trust.clone()),
            ledger: BudgetLedger::with_config(config.budget.clone()),
            overrides: OverrideRegistry::new(),
            collector: FeedbackCollector::new(),
            telemetry: TelemetryCollector::new(),
            store: None,
            pending: Mutex::new(HashMap::new()),
            update_cycle: Mutex::new(()),
            config,
        })
    }

    /// Engine with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default())
    }

    /// Attach a persistence backend
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Classify one unit of work
    ///
    /// Validates, extracts, scores, and decides against read-only
    /// snapshots, then records the spend and retains the decision context
    /// for the feedback join.
    pub async fn classify_request(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse> {
        request.validate()?;

        let extraction = self
            .extractor
            .extract(&request.task_content, &request.context)
            .await;
        if extraction.extraction_degraded {
            self.telemetry.record(TelemetryEvent::ExtractionDegraded {
                timestamp: Instant::now(),
            });
        }

        let weights = self.weights.read().unwrap().clone();
        let scorer = ComplexityScorer::new((*weights).clone());
        let breakdown = scorer.score(&extraction.factors);

        let budget_snapshot = self.ledger.snapshot();
        if budget_snapshot.exhausted() {
            self.telemetry.record(TelemetryEvent::BudgetExhausted {
                timestamp: Instant::now(),
            });
        }

        let active_override = self.overrides.resolve(&request.user_id, Utc::now());
        let quality = self.quality_requirements(request);

        let classification_id = Uuid::new_v4();
        let decision = classify(
            DecisionInputs {
                breakdown: &breakdown,
                quality,
                budget: budget_snapshot,
                thresholds: &self.config.thresholds,
                active_override: active_override.as_ref(),
                extraction_degraded: extraction.extraction_degraded,
            },
            classification_id,
        );

        if let Some(reason) = &decision.override_applied {
            self.telemetry.record(TelemetryEvent::OverrideApplied {
                reason: reason.clone(),
                timestamp: Instant::now(),
            });
        }
        self.telemetry.record(TelemetryEvent::ClassificationMade {
            classification: decision.classification,
            complexity_score: decision.reasoning.complexity_score,
            confidence: decision.confidence,
            timestamp: Instant::now(),
        });

        self.spend(decision.reasoning.cost_estimate).await;

        self.pending.lock().unwrap().insert(
            classification_id,
            PendingDecision {
                user_id: request.user_id.clone(),
                factors: extraction.factors,
                predicted_score: breakdown.score,
            },
        );

        let routing = self.routing_for(&decision.classification, breakdown.score, request);
        Ok(ClassificationResponse {
            classification: decision.classification,
            confidence: decision.confidence,
            reasoning: decision.reasoning,
            routing,
            monitoring: MonitoringInfo {
                classification_id,
                feedback_required: true,
                override_available: active_override.is_none(),
            },
        })
    }

    /// Ingest one outcome record
    ///
    /// Idempotent per classification id. Out-of-range values are clipped
    /// and flagged. Accepted records update the agent's trust history and
    /// may trigger a weight-update cycle.
    pub async fn submit_feedback(&self, record: FeedbackRecord) -> Result<FeedbackAck> {
        let pending = {
            let map = self.pending.lock().unwrap();
            map.get(&record.classification_id).cloned()
        };
        let Some(pending) = pending else {
            // Context already consumed (a record was accepted) or the id
            // was never issued
            let flag = if self.collector.was_accepted(&record.classification_id) {
                AnomalyFlag::DuplicateSubmission
            } else {
                AnomalyFlag::UnknownClassification
            };
            self.telemetry.record(TelemetryEvent::FeedbackAnomaly {
                classification_id: record.classification_id.to_string(),
                detail: format!("{flag:?}"),
                timestamp: Instant::now(),
            });
            return Ok(FeedbackAck {
                accepted: false,
                anomaly_flags: vec![flag],
            });
        };

        let ack = self
            .collector
            .ingest(record.clone(), pending.factors, pending.predicted_score);
        for flag in &ack.anomaly_flags {
            self.telemetry.record(TelemetryEvent::FeedbackAnomaly {
                classification_id: record.classification_id.to_string(),
                detail: format!("{flag:?}"),
                timestamp: Instant::now(),
            });
        }
        if !ack.accepted {
            return Ok(ack);
        }

        // The record is in the update stream; release the decision context
        self.pending.lock().unwrap().remove(&record.classification_id);

        let (sanitized, _) = record.clipped();
        self.update_trust(&pending.user_id, &sanitized).await;

        if self.collector.pending_count() >= self.config.feedback.min_batch_size {
            self.run_update_cycle();
        }

        Ok(ack)
    }

    /// Current trust score for an agent
    pub async fn get_trust_score(&self, agent_id: &str) -> Result<TrustScore> {
        self.trust.get_score(agent_id).await
    }

    /// Register a manual override
    pub fn apply_override(&self, directive: ManualOverride) -> Result<OverrideAck> {
        let (ack, superseded) = self.overrides.apply(directive)?;
        for reason in superseded {
            self.telemetry.record(TelemetryEvent::OverrideSuperseded {
                reason,
                timestamp: Instant::now(),
            });
        }
        Ok(ack)
    }

    /// Run one weight-update cycle over the pending batch
    ///
    /// Publishes a new immutable weight version; in-flight decisions keep
    /// the version they started with.
    pub fn run_update_cycle(&self) {
        // Drain, compute, and publish as one unit: a concurrent caller
        // that raced past the batch-size check waits here and then drains
        // an empty batch instead of republishing a stale version read
        let _cycle = self.update_cycle.lock().unwrap();
        let batch = self.collector.drain_batch();
        if batch.is_empty() {
            return;
        }

        let params = self.config.feedback.update;
        let old = self.weights.read().unwrap().clone();
        let new_version = update_factor_weights(&old, &batch, &params);
        let version = new_version.version;
        *self.weights.write().unwrap() = Arc::new(new_version);

        let new_trust_weights = update_trust_weights(&self.trust.weights(), &batch, &params);
        // The bounded rule keeps the sum valid; a failed swap would mean
        // a bug in the updater, not bad input
        let _ = self.trust.set_weights(new_trust_weights);

        self.telemetry.record(TelemetryEvent::WeightsPublished {
            version,
            batch_size: batch.len(),
            timestamp: Instant::now(),
        });
    }

    /// Active weight version snapshot
    pub fn current_weights(&self) -> Arc<WeightVersion> {
        self.weights.read().unwrap().clone()
    }

    /// Budget ledger (snapshot reads)
    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    /// Telemetry collector
    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Number of decisions still awaiting feedback
    pub fn pending_feedback_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Restore trust history and ledger state from the attached store
    pub async fn restore_agent(&self, agent_id: &str) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        match store.load_trust_history(agent_id).await? {
            Some(history) => {
                self.trust.import_history(agent_id, history).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resume the current budget day from the attached store
    pub async fn restore_ledger(&self) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        match store.load_ledger().await? {
            Some(state) => {
                self.ledger.apply_usage(&state);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn quality_requirements(&self, request: &ClassificationRequest) -> QualityRequirements {
        let trust_level_threshold = match request.constraints.quality_threshold {
            Some(threshold) => threshold,
            None => match request.context.quality_preference {
                QualityPreference::Quality => 4.0,
                QualityPreference::Balanced => 3.0,
                QualityPreference::Cost => 2.0,
            },
        };
        QualityRequirements {
            trust_level_threshold,
        }
    }

    fn routing_for(
        &self,
        classification: &Classification,
        score: f64,
        request: &ClassificationRequest,
    ) -> RoutingInfo {
        let (provider, mode, base_time_ms) = match classification {
            Classification::Basic => ("standard-pool".to_string(), ProcessingMode::Fast, 2_000),
            Classification::Complex => {
                ("premium-pool".to_string(), ProcessingMode::Thorough, 8_000)
            }
        };
        let mut estimated_time_ms = base_time_ms + (score * 10_000.0) as u64;
        if let Some(max_time_ms) = request.constraints.max_time_ms {
            estimated_time_ms = estimated_time_ms.min(max_time_ms);
        }
        RoutingInfo {
            recommended_provider: provider,
            processing_mode: mode,
            estimated_time_ms,
        }
    }

    /// Record a spend and surface threshold-mode transitions
    async fn spend(&self, amount: f64) {
        let mode_before = self.ledger.mode();
        self.ledger.spend(amount);
        let mode_after = self.ledger.mode();

        match (mode_before, mode_after) {
            (ThresholdMode::Default, ThresholdMode::CostOverride) => {
                self.telemetry.record(TelemetryEvent::ThresholdEscalated {
                    remaining_fraction: self.ledger.remaining_fraction(),
                    timestamp: Instant::now(),
                });
            }
            (ThresholdMode::CostOverride, ThresholdMode::Default) => {
                self.telemetry.record(TelemetryEvent::ThresholdReverted {
                    remaining_fraction: self.ledger.remaining_fraction(),
                    timestamp: Instant::now(),
                });
            }
            _ => {}
        }

        if let Some(store) = &self.store {
            let state = self.ledger.to_state();
            // Ledger state is recoverable from the daily reset; a failed
            // write is logged but does not fail the request
            if with_retries(|| async { store.save_ledger(&state).await })
                .await
                .is_err()
            {
                self.telemetry.record(TelemetryEvent::FeedbackAnomaly {
                    classification_id: "ledger".to_string(),
                    detail: "ledger persistence failed".to_string(),
                    timestamp: Instant::now(),
                });
            }
        }
    }

    /// Update an agent's trust history from a sanitized record
    async fn update_trust(&self, agent_id: &str, record: &FeedbackRecord) {
        let prior = self.trust.get_score(agent_id).await.ok();
        let historical = prior.as_ref().map(|s| s.value / 5.0).unwrap_or(0.5);

        let components = TrustComponents {
            response_quality: record.quality_achieved / 5.0,
            user_satisfaction: record.user_satisfaction / 5.0,
            interaction_success: if record.accuracy_verified { 1.0 } else { 0.5 },
            historical_reliability: historical,
            vibe_alignment: record.cost_efficiency,
        };
        self.trust.record_outcome(agent_id, components).await;

        if let Some(store) = &self.store {
            if let Ok(history) = self.trust.export_history(agent_id).await {
                let write = with_retries(|| {
                    let history = history.clone();
                    async move { store.save_trust_history(agent_id, &history).await }
                })
                .await;
                if write.is_err() {
                    // Serve the score as stale rather than pretending the
                    // write landed
                    self.trust.mark_stale(agent_id).await;
                    self.telemetry.record(TelemetryEvent::TrustMarkedStale {
                        agent_id: agent_id.to_string(),
                        timestamp: Instant::now(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::OverrideType;
    use chrono::Duration;

    fn engine() -> ClassificationEngine {
        ClassificationEngine::with_defaults().unwrap()
    }

    fn feedback_for(id: Uuid) -> FeedbackRecord {
        FeedbackRecord {
            classification_id: id,
            actual_complexity: 0.3,
            user_satisfaction: 4.5,
            cost_efficiency: 0.9,
            quality_achieved: 4.0,
            processing_time_ms: 1200,
            accuracy_verified: true,
        }
    }

    #[tokio::test]
    async fn test_simple_question_classifies_basic() {
        let engine = engine();
        let request = ClassificationRequest::new("What is the capital of France?", "user-1");
        let response = engine.classify_request(&request).await.unwrap();

        assert_eq!(response.classification, Classification::Basic);
        assert!(response.confidence > 0.8);
        assert_eq!(response.routing.processing_mode, ProcessingMode::Fast);
        assert!(response.monitoring.feedback_required);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_extraction() {
        let engine = engine();
        let request = ClassificationRequest::new("", "user-1");
        assert!(engine.classify_request(&request).await.is_err());
        // Nothing was classified or spent
        assert_eq!(engine.telemetry().event_count(), 0);
        assert_eq!(engine.ledger().remaining(), 100.0);
    }

    #[tokio::test]
    async fn test_feedback_roundtrip_updates_trust() {
        let engine = engine();
        let request = ClassificationRequest::new("Summarize the attached report", "agent-7");
        let response = engine.classify_request(&request).await.unwrap();

        let ack = engine
            .submit_feedback(feedback_for(response.monitoring.classification_id))
            .await
            .unwrap();
        assert!(ack.accepted);

        let score = engine.get_trust_score("agent-7").await.unwrap();
        assert!((0.0..=5.0).contains(&score.value));
        assert_eq!(score.sample_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_feedback_is_noop() {
        let engine = engine();
        let request = ClassificationRequest::new("Summarize the attached report", "agent-7");
        let response = engine.classify_request(&request).await.unwrap();
        let id = response.monitoring.classification_id;

        engine.submit_feedback(feedback_for(id)).await.unwrap();
        let ack = engine.submit_feedback(feedback_for(id)).await.unwrap();
        assert!(!ack.accepted);
        assert_eq!(ack.anomaly_flags, vec![AnomalyFlag::DuplicateSubmission]);

        let score = engine.get_trust_score("agent-7").await.unwrap();
        assert_eq!(score.sample_count, 1);
    }

    #[tokio::test]
    async fn test_accepted_feedback_releases_decision_context() {
        let engine = engine();
        let request = ClassificationRequest::new("Summarize the attached report", "agent-7");
        let response = engine.classify_request(&request).await.unwrap();
        assert_eq!(engine.pending_feedback_count(), 1);

        engine
            .submit_feedback(feedback_for(response.monitoring.classification_id))
            .await
            .unwrap();
        assert_eq!(engine.pending_feedback_count(), 0);

        // A duplicate after release is still recognized as a duplicate,
        // not an unknown id
        let ack = engine
            .submit_feedback(feedback_for(response.monitoring.classification_id))
            .await
            .unwrap();
        assert!(!ack.accepted);
        assert_eq!(ack.anomaly_flags, vec![AnomalyFlag::DuplicateSubmission]);
    }

    #[tokio::test]
    async fn test_unknown_classification_feedback_flagged() {
        let engine = engine();
        let ack = engine
            .submit_feedback(feedback_for(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(!ack.accepted);
        assert_eq!(ack.anomaly_flags, vec![AnomalyFlag::UnknownClassification]);
    }

    #[tokio::test]
    async fn test_override_changes_routing() {
        let engine = engine();
        engine
            .apply_override(ManualOverride {
                override_type: OverrideType::ForceComplex,
                reason: "quality audit".to_string(),
                authorized_by: "ops".to_string(),
                authorized_at: Utc::now(),
                expires_at: Utc::now() + Duration::hours(1),
                cost_approved: true,
                user_id: Some("user-1".to_string()),
            })
            .unwrap();

        let request = ClassificationRequest::new("What is the capital of France?", "user-1");
        let response = engine.classify_request(&request).await.unwrap();
        assert_eq!(response.classification, Classification::Complex);
        assert!(!response.monitoring.override_available);

        // Other users are untouched by the scoped override
        let other = ClassificationRequest::new("What is the capital of France?", "user-2");
        let response = engine.classify_request(&other).await.unwrap();
        assert_eq!(response.classification, Classification::Basic);
    }

    #[tokio::test]
    async fn test_weight_cycle_publishes_new_version() {
        let engine = engine();
        let v1 = engine.current_weights().version;

        for i in 0..10 {
            let request =
                ClassificationRequest::new(format!("Review item number {i}"), "agent-1");
            let response = engine.classify_request(&request).await.unwrap();
            engine
                .submit_feedback(feedback_for(response.monitoring.classification_id))
                .await
                .unwrap();
        }

        let v2 = engine.current_weights().version;
        assert!(v2 > v1, "expected a published weight version after batch");
        assert!(engine.current_weights().weights.validate().is_ok());
    }

    #[tokio::test]
    async fn test_max_time_caps_estimate() {
        let engine = engine();
        let mut request = ClassificationRequest::new(
            "First research the architecture, then compare migration strategies, \
             analyze encryption options, and finally evaluate compliance impact.",
            "user-1",
        );
        request.constraints.max_time_ms = Some(3_000);
        let response = engine.classify_request(&request).await.unwrap();
        assert!(response.routing.estimated_time_ms <= 3_000);
    }
}
