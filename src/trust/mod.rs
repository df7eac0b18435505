//! Per-agent trust scoring
//! Five-component weighted scores with historical trend and confidence

pub mod tracker;
pub mod types;

pub use tracker::TrustTracker;
pub use types::{round2, TrustComponents, TrustConfig, TrustScore, TrustSnapshot, TrustWeights};
