//! Feature extractor implementation
//!
//! Multi-signal heuristic extraction with an optional NLU refinement pass:
//! - Bounded output: every factor in [0.0, 1.0]
//! - Bounded latency: NLU calls run under an explicit deadline
//! - Never fails a request: timeouts degrade to conservative defaults

use crate::extraction::nlu::NluClient;
use crate::extraction::types::{ExtractionResult, RawSignals};
use crate::scoring::ComplexityFactors;
use crate::types::TaskContext;
use std::sync::Arc;
use std::time::Duration;

/// Domains that demand specialist expertise
const SPECIALIST_DOMAINS: [&str; 6] = [
    "legal",
    "medical",
    "finance",
    "security",
    "scientific",
    "engineering",
];

/// Technical keywords that correlate with content complexity
const TECHNICAL_KEYWORDS: [&str; 20] = [
    "api",
    "database",
    "schema",
    "algorithm",
    "architecture",
    "concurrency",
    "distributed",
    "encryption",
    "compliance",
    "regulation",
    "protocol",
    "optimization",
    "statistical",
    "regression",
    "diagnosis",
    "litigation",
    "derivative",
    "portfolio",
    "migration",
    "infrastructure",
];

/// Multi-step phrasing indicators
const STEP_INDICATORS: [&str; 10] = [
    "first",
    "second",
    "third",
    "then",
    "next",
    "finally",
    "after that",
    "followed by",
    "step 1",
    "step 2",
];

/// Research-demand indicators
const RESEARCH_KEYWORDS: [&str; 10] = [
    "research",
    "compare",
    "evaluate",
    "investigate",
    "analyze",
    "literature",
    "sources",
    "comprehensive",
    "in-depth",
    "survey",
];

/// Vague phrasing that signals a knowledge gap
const VAGUE_WORDS: [&str; 6] = ["somehow", "maybe", "roughly", "perhaps", "possibly", "something"];

/// Recency demands the engine cannot answer from settled knowledge
const RECENCY_WORDS: [&str; 5] = ["latest", "newest", "most recent", "up-to-date", "upcoming"];

/// Feature extractor configuration
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Deadline for the external NLU call (default: 200ms)
    pub nlu_timeout_ms: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self { nlu_timeout_ms: 200 }
    }
}

/// Feature extractor with optional NLU refinement
#[derive(Clone)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
    nlu: Option<Arc<dyn NluClient>>,
}

impl FeatureExtractor {
    /// Create a purely heuristic extractor
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Create an extractor with custom configuration
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config, nlu: None }
    }

    /// Attach an external NLU backend for refinement
    pub fn with_nlu(mut self, nlu: Arc<dyn NluClient>) -> Self {
        self.nlu = Some(nlu);
        self
    }

    /// Extract complexity factors from task content and context
    ///
    /// When an NLU backend is attached, its call is bounded by the
    /// configured deadline; timeout or error substitutes the conservative
    /// default vector (all 0.5) and sets `extraction_degraded`. This never
    /// fails the request.
    pub async fn extract(&self, content: &str, context: &TaskContext) -> ExtractionResult {
        let signals = self.collect_signals(content);
        let heuristic = self.heuristic_factors(content, context, &signals);

        let Some(nlu) = &self.nlu else {
            return ExtractionResult {
                factors: heuristic,
                signals,
                extraction_degraded: false,
            };
        };

        let deadline = Duration::from_millis(self.config.nlu_timeout_ms);
        match tokio::time::timeout(deadline, nlu.analyze(content)).await {
            Ok(Ok(analysis)) => {
                let factors = blend(heuristic, analysis.factors.clamped(), analysis.model_confidence);
                ExtractionResult {
                    factors,
                    signals,
                    extraction_degraded: false,
                }
            }
            // Timeout or backend failure: degrade, never block or fail
            Ok(Err(_)) | Err(_) => ExtractionResult::degraded(signals),
        }
    }

    /// Collect raw text signals for explainability
    fn collect_signals(&self, content: &str) -> RawSignals {
        let lower = content.to_lowercase();
        let tokens: Vec<&str> = content.split_whitespace().collect();
        let token_count = tokens.len();

        let sentence_count = lower
            .chars()
            .filter(|c| matches!(c, '.' | '?' | '!' | ';'))
            .count()
            .max(1);

        let domain_keyword_hits = TECHNICAL_KEYWORDS
            .iter()
            .filter(|kw| lower.contains(**kw))
            .count();

        // Capitalized non-leading tokens approximate named entities
        let capitalized = tokens
            .iter()
            .skip(1)
            .filter(|t| t.chars().next().is_some_and(|c| c.is_uppercase()))
            .count();
        let entity_density = if token_count > 1 {
            capitalized as f64 / (token_count - 1) as f64
        } else {
            0.0
        };

        let step_indicator_hits = STEP_INDICATORS
            .iter()
            .filter(|si| lower.contains(**si))
            .count();

        let vague_word_hits = VAGUE_WORDS.iter().filter(|w| lower.contains(**w)).count();

        // Short single-sentence questions read as factual lookups
        let factual_lookup = token_count <= 12
            && sentence_count <= 1
            && ["what", "who", "when", "where", "which"]
                .iter()
                .any(|q| lower.starts_with(q));

        RawSignals {
            token_count,
            sentence_count,
            domain_keyword_hits,
            entity_density,
            step_indicator_hits,
            vague_word_hits,
            factual_lookup,
        }
    }

    /// Combine signals into the five normalized factors
    fn heuristic_factors(
        &self,
        content: &str,
        context: &TaskContext,
        signals: &RawSignals,
    ) -> ComplexityFactors {
        let lower = content.to_lowercase();

        // Length, sentence structure, and technical density
        let length_score = (signals.token_count as f64 / 150.0).min(1.0) * 0.4;
        let sentence_score =
            ((signals.sentence_count.saturating_sub(1)) as f64 / 6.0).min(1.0) * 0.3;
        let tech_score = (signals.domain_keyword_hits as f64 / 4.0).min(1.0) * 0.3;
        let content_complexity = (length_score + sentence_score + tech_score).min(1.0);

        // Declared specialist domains raise the expertise demand
        let domain_bump = match context.domain.as_deref() {
            Some(domain) if SPECIALIST_DOMAINS.iter().any(|d| domain.contains(d)) => 0.3,
            Some(_) => 0.1,
            None => 0.0,
        };
        let domain_expertise_required =
            ((signals.domain_keyword_hits as f64 / 5.0).min(1.0) * 0.7 + domain_bump).min(1.0);

        let research_hits = RESEARCH_KEYWORDS
            .iter()
            .filter(|kw| lower.contains(**kw))
            .count();
        let mut research_depth_required = (research_hits as f64 * 0.25).min(1.0);
        if signals.factual_lookup {
            research_depth_required = research_depth_required.min(0.1);
        }

        let multi_step_reasoning = ((signals.step_indicator_hits as f64 / 3.0).min(1.0) * 0.8
            + if lower.contains("and then") { 0.2 } else { 0.0 })
        .min(1.0);

        let recency_hits = RECENCY_WORDS.iter().filter(|w| lower.contains(**w)).count();
        let mut knowledge_gap = (signals.vague_word_hits as f64 * 0.15
            + recency_hits as f64 * 0.2
            + if context.domain.is_none() { 0.1 } else { 0.0 })
        .min(1.0);
        if signals.factual_lookup {
            knowledge_gap = knowledge_gap.min(0.1);
        }

        ComplexityFactors {
            content_complexity,
            domain_expertise_required,
            research_depth_required,
            multi_step_reasoning,
            knowledge_gap,
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Shift heuristic factors toward the NLU estimate by up to half,
/// proportional to the backend's own confidence
fn blend(heuristic: ComplexityFactors, refined: ComplexityFactors, confidence: f64) -> ComplexityFactors {
    let w = confidence.clamp(0.0, 1.0) * 0.5;
    let mix = |h: f64, r: f64| (h + (r - h) * w).clamp(0.0, 1.0);
    ComplexityFactors {
        content_complexity: mix(heuristic.content_complexity, refined.content_complexity),
        domain_expertise_required: mix(
            heuristic.domain_expertise_required,
            refined.domain_expertise_required,
        ),
        research_depth_required: mix(
            heuristic.research_depth_required,
            refined.research_depth_required,
        ),
        multi_step_reasoning: mix(heuristic.multi_step_reasoning, refined.multi_step_reasoning),
        knowledge_gap: mix(heuristic.knowledge_gap, refined.knowledge_gap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{EngineError, Result};
    use crate::extraction::nlu::NluAnalysis;
    use async_trait::async_trait;

    struct SlowNlu {
        delay_ms: u64,
    }

    #[async_trait]
    impl NluClient for SlowNlu {
        async fn analyze(&self, _content: &str) -> Result<NluAnalysis> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(NluAnalysis {
                factors: ComplexityFactors::uniform(0.9),
                model_confidence: 1.0,
            })
        }
    }

    struct FailingNlu;

    #[async_trait]
    impl NluClient for FailingNlu {
        async fn analyze(&self, _content: &str) -> Result<NluAnalysis> {
            Err(EngineError::NluError("backend unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_factual_lookup_scores_low() {
        let extractor = FeatureExtractor::new();
        let result = extractor
            .extract("What is the capital of France?", &TaskContext::default())
            .await;

        assert!(!result.extraction_degraded);
        assert!(result.signals.factual_lookup);
        for (name, value) in result.factors.named() {
            assert!(value <= 0.15, "{name} = {value} too high for a lookup");
        }
    }

    #[tokio::test]
    async fn test_multi_step_technical_task_scores_higher() {
        let extractor = FeatureExtractor::new();
        let content = "First research the current database schema, then compare \
                       migration strategies, analyze the API architecture, and \
                       finally evaluate encryption options for compliance.";
        let result = extractor.extract(content, &TaskContext::default()).await;

        assert!(result.factors.multi_step_reasoning > 0.5);
        assert!(result.factors.research_depth_required > 0.5);
        assert!(result.factors.content_complexity > 0.2);
    }

    #[tokio::test]
    async fn test_specialist_domain_raises_expertise() {
        let extractor = FeatureExtractor::new();
        let mut context = TaskContext::default();
        context.domain = Some("medical".to_string());

        let with_domain = extractor
            .extract("Review the diagnosis notes", &context)
            .await;
        let without = extractor
            .extract("Review the diagnosis notes", &TaskContext::default())
            .await;

        assert!(
            with_domain.factors.domain_expertise_required
                > without.factors.domain_expertise_required
        );
    }

    #[tokio::test]
    async fn test_factors_always_bounded() {
        let extractor = FeatureExtractor::new();
        let contents = [
            "",
            "a",
            "Maybe somehow possibly analyze research compare evaluate investigate \
             the latest newest comprehensive in-depth literature survey first then \
             next finally step 1 step 2 api database schema algorithm architecture",
        ];
        for content in contents {
            let result = extractor.extract(content, &TaskContext::default()).await;
            for (name, value) in result.factors.named() {
                assert!((0.0..=1.0).contains(&value), "{name} = {value} out of range");
            }
        }
    }

    #[tokio::test]
    async fn test_nlu_timeout_degrades_to_defaults() {
        let extractor = FeatureExtractor::with_config(ExtractorConfig { nlu_timeout_ms: 20 })
            .with_nlu(Arc::new(SlowNlu { delay_ms: 500 }));

        let result = extractor
            .extract("Summarize this report", &TaskContext::default())
            .await;

        assert!(result.extraction_degraded);
        assert_eq!(result.factors, ComplexityFactors::degraded_default());
    }

    #[tokio::test]
    async fn test_nlu_failure_degrades_to_defaults() {
        let extractor = FeatureExtractor::new().with_nlu(Arc::new(FailingNlu));
        let result = extractor
            .extract("Summarize this report", &TaskContext::default())
            .await;

        assert!(result.extraction_degraded);
        assert_eq!(result.factors, ComplexityFactors::degraded_default());
    }

    #[tokio::test]
    async fn test_fast_nlu_refines_without_degradation() {
        let extractor = FeatureExtractor::new().with_nlu(Arc::new(SlowNlu { delay_ms: 0 }));
        let result = extractor
            .extract("What is the capital of France?", &TaskContext::default())
            .await;

        assert!(!result.extraction_degraded);
        // Refinement pulls the low heuristic estimate toward the backend's 0.9
        assert!(result.factors.content_complexity > 0.1);
    }

    #[test]
    fn test_entity_density_signal() {
        let extractor = FeatureExtractor::new();
        let dense = extractor.collect_signals("Compare France Germany Italy Spain");
        let sparse = extractor.collect_signals("compare the four largest countries");
        assert!(dense.entity_density > sparse.entity_density);
    }
}
