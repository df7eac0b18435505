//! Complexity scoring system
//! Weighted aggregation of complexity factors with a per-factor audit trail

pub mod scorer;
pub mod types;

pub use scorer::ComplexityScorer;
pub use types::{
    ComplexityBreakdown, ComplexityFactors, FactorContribution, FactorWeights, WeightVersion,
};
