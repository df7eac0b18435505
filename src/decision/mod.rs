//! Classification decision engine
//! Pure precedence-ordered rule evaluation over read-only snapshots

pub mod engine;
pub mod overrides;
pub mod types;

pub use engine::{classify, DecisionInputs};
pub use overrides::OverrideRegistry;
pub use types::{
    Classification, ClassificationDecision, DecisionReasoning, DecisionRule, DecisionThresholds,
    ManualOverride, OverrideAck, OverrideType, QualityRequirements,
};
