//! Wire-facing request and response contracts

pub mod request;
pub mod response;

pub use request::{
    ClassificationRequest, QualityPreference, TaskConstraints, TaskContext, Urgency,
};
pub use response::{ClassificationResponse, MonitoringInfo, ProcessingMode, RoutingInfo};
