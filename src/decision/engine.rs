//! Pure classification function
//!
//! Evaluates the precedence-ordered rule set against read-only snapshots.
//! No shared state is touched: identical inputs always produce identical
//! decisions, so calls may run fully in parallel.

use crate::budget::BudgetSnapshot;
use crate::decision::types::{
    Classification, ClassificationDecision, DecisionReasoning, DecisionRule, DecisionThresholds,
    ManualOverride, OverrideType, QualityRequirements,
};
use crate::scoring::ComplexityBreakdown;
use uuid::Uuid;

/// Confidence ceiling applied when extraction degraded
const DEGRADED_CONFIDENCE_CAP: f64 = 0.6;

/// Read-only inputs to one classification
#[derive(Debug, Clone, Copy)]
pub struct DecisionInputs<'a> {
    /// Complexity score with its audit breakdown
    pub breakdown: &'a ComplexityBreakdown,

    /// Caller quality requirements
    pub quality: QualityRequirements,

    /// Budget ledger snapshot
    pub budget: BudgetSnapshot,

    /// Versioned rule constants
    pub thresholds: &'a DecisionThresholds,

    /// Resolved active override for this request scope, if any
    pub active_override: Option<&'a ManualOverride>,

    /// Whether feature extraction fell back to degraded defaults
    pub extraction_degraded: bool,
}

/// Classify one unit of work
///
/// Precedence (first match wins):
/// 1. active manual override
/// 2. hard complexity floor (absolute, immune to budget pressure)
/// 3. exhausted budget forces basic
/// 4. high-trust escalation at moderate complexity
/// 5. cost-override mode forces the cheaper path below the relief ceiling
/// 6. dynamic complexity threshold
/// 7. default basic
///
/// `classification_id` is supplied by the caller so the function stays pure.
pub fn classify(inputs: DecisionInputs<'_>, classification_id: Uuid) -> ClassificationDecision {
    let score = inputs.breakdown.score;
    let thresholds = inputs.thresholds;
    let active = inputs.budget.thresholds;

    let mut notes = Vec::new();
    let mut override_applied = None;

    let (classification, rule, boundary) = if let Some(directive) = inputs.active_override {
        override_applied = Some(directive.reason.clone());
        let classification = match &directive.override_type {
            OverrideType::ForceBasic => Classification::Basic,
            OverrideType::ForceComplex => Classification::Complex,
            OverrideType::CustomThreshold {
                complexity_threshold,
            } => {
                notes.push(format!(
                    "custom threshold {complexity_threshold} substituted by override"
                ));
                if score >= *complexity_threshold {
                    Classification::Complex
                } else {
                    Classification::Basic
                }
            }
        };
        (classification, DecisionRule::Override, None)
    } else if score >= thresholds.hard_complexity_floor {
        // Absolute quality floor: budget pressure cannot downgrade this
        (
            Classification::Complex,
            DecisionRule::HardComplexityFloor,
            Some(thresholds.hard_complexity_floor),
        )
    } else if inputs.budget.exhausted() {
        notes.push("daily budget exhausted; forced basic".to_string());
        (
            Classification::Basic,
            DecisionRule::BudgetExhausted,
            Some(active.complexity_threshold),
        )
    } else if inputs.quality.trust_level_threshold >= thresholds.trust_escalation_threshold
        && score >= thresholds.trust_escalation_min_complexity
    {
        (
            Classification::Complex,
            DecisionRule::TrustEscalation,
            Some(thresholds.trust_escalation_min_complexity),
        )
    } else if inputs.budget.budget_limited() && score < thresholds.budget_relief_ceiling {
        notes.push(format!(
            "cost-override mode active (remaining fraction {:.2})",
            inputs.budget.remaining_fraction()
        ));
        (
            Classification::Basic,
            DecisionRule::BudgetRelief,
            Some(active.complexity_threshold),
        )
    } else if score >= active.complexity_threshold {
        (
            Classification::Complex,
            DecisionRule::DynamicThreshold,
            Some(active.complexity_threshold),
        )
    } else {
        (
            Classification::Basic,
            DecisionRule::Default,
            Some(active.complexity_threshold),
        )
    };

    if inputs.extraction_degraded {
        notes.push("feature extraction degraded; conservative defaults used".to_string());
    }

    let confidence = decision_confidence(score, boundary, inputs.extraction_degraded);
    let cost_estimate = estimate_cost(classification, score, &inputs.budget);
    let quality_prediction = predict_quality(classification, score);

    ClassificationDecision {
        classification,
        confidence,
        reasoning: DecisionReasoning {
            complexity_score: score,
            factors: inputs.breakdown.contributions.clone(),
            cost_estimate,
            quality_prediction,
            rule,
            notes,
        },
        classification_id,
        override_applied,
    }
}

/// Confidence from distance to the governing boundary
///
/// Scores far from the boundary classify confidently; scores near it do
/// not. Overrides (no boundary) are fully confident. Degraded extraction
/// caps confidence regardless of distance.
fn decision_confidence(score: f64, boundary: Option<f64>, degraded: bool) -> f64 {
    let raw = match boundary {
        Some(boundary) => 0.5 + (score - boundary).abs().min(0.5),
        None => 1.0,
    };
    if degraded {
        raw.min(DEGRADED_CONFIDENCE_CAP)
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// Deterministic cost model for the reasoning trace
fn estimate_cost(classification: Classification, score: f64, budget: &BudgetSnapshot) -> f64 {
    let base = match classification {
        Classification::Basic => 0.01 + score * 0.04,
        Classification::Complex => 0.10 + score * 0.40,
    };
    base.min(budget.cost_per_request_limit)
}

/// Deterministic quality prediction for the reasoning trace
fn predict_quality(classification: Classification, score: f64) -> f64 {
    let predicted = match classification {
        // The basic path degrades quickly as tasks get harder
        Classification::Basic => 4.2 - score * 1.8,
        Classification::Complex => 4.6 - score * 0.4,
    };
    predicted.clamp(0.0, 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{ActiveThresholds, ThresholdMode};
    use crate::scoring::{ComplexityFactors, ComplexityScorer};
    use chrono::{Duration, Utc};

    fn breakdown_for(level: f64) -> ComplexityBreakdown {
        ComplexityScorer::default().score(&ComplexityFactors::uniform(level))
    }

    fn healthy_budget() -> BudgetSnapshot {
        BudgetSnapshot {
            daily_budget: 100.0,
            current_usage: 10.0,
            budget_remaining: 90.0,
            cost_per_request_limit: 1.0,
            thresholds: ActiveThresholds {
                complexity_threshold: 0.6,
                quality_threshold: 3.5,
                mode: ThresholdMode::Default,
            },
        }
    }

    fn pressured_budget() -> BudgetSnapshot {
        BudgetSnapshot {
            daily_budget: 100.0,
            current_usage: 85.0,
            budget_remaining: 15.0,
            cost_per_request_limit: 1.0,
            thresholds: ActiveThresholds {
                complexity_threshold: 0.8,
                quality_threshold: 4.5,
                mode: ThresholdMode::CostOverride,
            },
        }
    }

    fn exhausted_budget() -> BudgetSnapshot {
        BudgetSnapshot {
            daily_budget: 100.0,
            current_usage: 100.0,
            budget_remaining: 0.0,
            cost_per_request_limit: 1.0,
            thresholds: ActiveThresholds {
                complexity_threshold: 0.8,
                quality_threshold: 4.5,
                mode: ThresholdMode::CostOverride,
            },
        }
    }

    fn inputs<'a>(
        breakdown: &'a ComplexityBreakdown,
        thresholds: &'a DecisionThresholds,
        budget: BudgetSnapshot,
    ) -> DecisionInputs<'a> {
        DecisionInputs {
            breakdown,
            quality: QualityRequirements::default(),
            budget,
            thresholds,
            active_override: None,
            extraction_degraded: false,
        }
    }

    #[test]
    fn test_hard_floor_is_absolute() {
        let breakdown = breakdown_for(0.75);
        let thresholds = DecisionThresholds::default();

        for budget in [healthy_budget(), pressured_budget(), exhausted_budget()] {
            let decision = classify(
                inputs(&breakdown, &thresholds, budget),
                Uuid::new_v4(),
            );
            assert_eq!(decision.classification, Classification::Complex);
            assert_eq!(decision.reasoning.rule, DecisionRule::HardComplexityFloor);
        }
    }

    #[test]
    fn test_simple_task_is_basic_with_high_confidence() {
        let breakdown = breakdown_for(0.1);
        let thresholds = DecisionThresholds::default();
        let decision = classify(
            inputs(&breakdown, &thresholds, healthy_budget()),
            Uuid::new_v4(),
        );
        assert_eq!(decision.classification, Classification::Basic);
        assert!(decision.confidence > 0.8);
    }

    #[test]
    fn test_dynamic_threshold_crossing() {
        let breakdown = breakdown_for(0.65);
        let thresholds = DecisionThresholds::default();
        let decision = classify(
            inputs(&breakdown, &thresholds, healthy_budget()),
            Uuid::new_v4(),
        );
        assert_eq!(decision.classification, Classification::Complex);
        assert_eq!(decision.reasoning.rule, DecisionRule::DynamicThreshold);
    }

    #[test]
    fn test_cost_override_downgrades_below_floor() {
        // Same 0.65 score flips to basic once thresholds escalate
        let breakdown = breakdown_for(0.65);
        let thresholds = DecisionThresholds::default();
        let decision = classify(
            inputs(&breakdown, &thresholds, pressured_budget()),
            Uuid::new_v4(),
        );
        assert_eq!(decision.classification, Classification::Basic);
        assert_eq!(decision.reasoning.rule, DecisionRule::BudgetRelief);
    }

    #[test]
    fn test_trust_escalation() {
        let breakdown = breakdown_for(0.45);
        let thresholds = DecisionThresholds::default();
        let mut decision_inputs = inputs(&breakdown, &thresholds, healthy_budget());
        decision_inputs.quality = QualityRequirements {
            trust_level_threshold: 4.2,
        };
        let decision = classify(decision_inputs, Uuid::new_v4());
        assert_eq!(decision.classification, Classification::Complex);
        assert_eq!(decision.reasoning.rule, DecisionRule::TrustEscalation);
    }

    #[test]
    fn test_exhausted_budget_forces_basic() {
        let breakdown = breakdown_for(0.5);
        let thresholds = DecisionThresholds::default();
        let mut decision_inputs = inputs(&breakdown, &thresholds, exhausted_budget());
        // Even a high-trust caller gets the basic path when exhausted
        decision_inputs.quality = QualityRequirements {
            trust_level_threshold: 4.5,
        };
        let decision = classify(decision_inputs, Uuid::new_v4());
        assert_eq!(decision.classification, Classification::Basic);
        assert_eq!(decision.reasoning.rule, DecisionRule::BudgetExhausted);
        assert!(decision
            .reasoning
            .notes
            .iter()
            .any(|n| n.contains("exhausted")));
    }

    #[test]
    fn test_force_override_wins_over_everything() {
        let breakdown = breakdown_for(0.2);
        let thresholds = DecisionThresholds::default();
        let directive = ManualOverride {
            override_type: OverrideType::ForceComplex,
            reason: "audit sampling".to_string(),
            authorized_by: "ops".to_string(),
            authorized_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(1),
            cost_approved: true,
            user_id: None,
        };
        let mut decision_inputs = inputs(&breakdown, &thresholds, exhausted_budget());
        decision_inputs.active_override = Some(&directive);
        let decision = classify(decision_inputs, Uuid::new_v4());
        assert_eq!(decision.classification, Classification::Complex);
        assert_eq!(decision.override_applied.as_deref(), Some("audit sampling"));
        assert_eq!(decision.confidence, 1.0);
    }

    #[test]
    fn test_custom_threshold_override() {
        let breakdown = breakdown_for(0.5);
        let thresholds = DecisionThresholds::default();
        let directive = ManualOverride {
            override_type: OverrideType::CustomThreshold {
                complexity_threshold: 0.45,
            },
            reason: "tuning experiment".to_string(),
            authorized_by: "ops".to_string(),
            authorized_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(1),
            cost_approved: true,
            user_id: None,
        };
        let mut decision_inputs = inputs(&breakdown, &thresholds, healthy_budget());
        decision_inputs.active_override = Some(&directive);
        let decision = classify(decision_inputs, Uuid::new_v4());
        assert_eq!(decision.classification, Classification::Complex);
        assert!(decision.override_applied.is_some());
    }

    #[test]
    fn test_degraded_extraction_caps_confidence() {
        let breakdown = breakdown_for(0.5);
        let thresholds = DecisionThresholds::default();
        let mut decision_inputs = inputs(&breakdown, &thresholds, healthy_budget());
        decision_inputs.extraction_degraded = true;
        let decision = classify(decision_inputs, Uuid::new_v4());
        assert!(decision.confidence <= 0.6);
        // Documented fallback choice: degraded defaults classify basic
        assert_eq!(decision.classification, Classification::Basic);
    }

    #[test]
    fn test_purity() {
        let breakdown = breakdown_for(0.55);
        let thresholds = DecisionThresholds::default();
        let id = Uuid::new_v4();
        let a = classify(inputs(&breakdown, &thresholds, healthy_budget()), id);
        let b = classify(inputs(&breakdown, &thresholds, healthy_budget()), id);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cost_estimate_respects_request_limit() {
        let breakdown = breakdown_for(0.95);
        let thresholds = DecisionThresholds::default();
        let mut budget = healthy_budget();
        budget.cost_per_request_limit = 0.25;
        let decision = classify(inputs(&breakdown, &thresholds, budget), Uuid::new_v4());
        assert!(decision.reasoning.cost_estimate <= 0.25);
    }
}
