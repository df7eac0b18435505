//! External NLU client interface
//!
//! The engine treats NLU refinement as an optional external collaborator:
//! calls are bounded by an explicit deadline and failures degrade the
//! extraction rather than failing the request.

use crate::errors::{EngineError, Result};
use crate::scoring::ComplexityFactors;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Refined factor estimates returned by an NLU backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluAnalysis {
    /// Factor vector estimated by the backend, each in [0.0, 1.0]
    pub factors: ComplexityFactors,

    /// Backend-reported confidence in its own estimate
    pub model_confidence: f64,
}

/// External NLU dependency for factor refinement
#[async_trait]
pub trait NluClient: Send + Sync {
    /// Analyze task content into refined complexity factors
    async fn analyze(&self, content: &str) -> Result<NluAnalysis>;
}

/// HTTP-backed NLU client
///
/// Posts `{"content": ...}` to the configured endpoint and expects an
/// `NluAnalysis` JSON body back.
pub struct HttpNluClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    content: &'a str,
}

impl HttpNluClient {
    /// Create a client against an NLU service endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NluClient for HttpNluClient {
    async fn analyze(&self, content: &str) -> Result<NluAnalysis> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { content })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::NluError(format!(
                "NLU service returned status {}",
                response.status()
            )));
        }

        let analysis: NluAnalysis = response.json().await?;
        Ok(analysis)
    }
}
