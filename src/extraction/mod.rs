//! Feature extraction for task analysis
//! Turns raw task text and context into a normalized complexity-factor vector
//! plus the raw signals used for explainability

pub mod extractor;
pub mod nlu;
pub mod types;

pub use extractor::{ExtractorConfig, FeatureExtractor};
pub use nlu::{HttpNluClient, NluAnalysis, NluClient};
pub use types::{ExtractionResult, RawSignals};
