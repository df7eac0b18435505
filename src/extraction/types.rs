//! Feature extraction type definitions

use crate::scoring::ComplexityFactors;
use serde::{Deserialize, Serialize};

/// Raw text signals retained for explainability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignals {
    /// Whitespace-delimited token count
    pub token_count: usize,

    /// Sentence count (terminal punctuation)
    pub sentence_count: usize,

    /// Technical/domain keyword hits
    pub domain_keyword_hits: usize,

    /// Capitalized-word ratio over non-leading tokens, in [0.0, 1.0]
    pub entity_density: f64,

    /// Multi-step indicator hits ("first", "then", "step 2", ...)
    pub step_indicator_hits: usize,

    /// Vague-language hits ("somehow", "maybe", ...)
    pub vague_word_hits: usize,

    /// Whether the content reads as a short factual lookup
    pub factual_lookup: bool,
}

/// Result of feature extraction for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Normalized complexity factors
    pub factors: ComplexityFactors,

    /// Raw signals behind the factors
    pub signals: RawSignals,

    /// True when the NLU dependency timed out or failed and the
    /// conservative default vector was substituted
    pub extraction_degraded: bool,
}

impl ExtractionResult {
    /// Degraded result: conservative defaults, flag set
    pub fn degraded(signals: RawSignals) -> Self {
        Self {
            factors: ComplexityFactors::degraded_default(),
            signals,
            extraction_degraded: true,
        }
    }
}
