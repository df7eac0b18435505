//! taskroute - Adaptive Task Classification Engine
//!
//! A decision service that scores incoming work on five complexity
//! factors, combines the score with per-agent trust and a live cost
//! budget, and emits an auditable basic/complex routing decision, then
//! learns from outcome feedback.
//!
//! # Architecture
//!
//! - **extraction**: task text -> normalized complexity factors
//! - **scoring**: versioned weighted aggregation with audit breakdown
//! - **trust**: per-agent five-component scores with trend and confidence
//! - **budget**: atomic cost ledger owning the adaptive thresholds
//! - **decision**: pure precedence-ordered classification
//! - **feedback**: idempotent outcome ingestion and bounded weight updates

pub mod errors;
pub mod types;
pub mod budget;
pub mod scoring;
pub mod extraction;
pub mod trust;
pub mod decision;
pub mod feedback;
pub mod persistence;
pub mod telemetry;
pub mod config;
pub mod engine;

// Re-export commonly used types
pub use errors::{EngineError, Result};

pub use config::EngineConfig;
pub use engine::ClassificationEngine;
pub use types::{ClassificationRequest, ClassificationResponse};
