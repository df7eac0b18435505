//! Outcome feedback collection and weight adaptation
//! Idempotent ingestion with anomaly clipping; weight updates are pure,
//! bounded, and versioned

pub mod collector;
pub mod types;
pub mod updater;

pub use collector::FeedbackCollector;
pub use types::{AnomalyFlag, FeedbackAck, FeedbackRecord, FeedbackSample};
pub use updater::{update_factor_weights, update_trust_weights, UpdateParams};
