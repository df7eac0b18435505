//! Trust history tracker
//!
//! Single-writer discipline per agent: the history map hands out one async
//! mutex per agent id, so updates to the same agent serialize while
//! different agents update fully in parallel.

use crate::errors::{EngineError, Result};
use crate::trust::types::{TrustComponents, TrustConfig, TrustScore, TrustSnapshot, TrustWeights};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock as StdRwLock};
use tokio::sync::{Mutex, RwLock};

/// Per-agent append-only history
#[derive(Debug, Default)]
struct AgentHistory {
    snapshots: Vec<TrustSnapshot>,
    stale: bool,
}

/// Trust score tracker for all agents
pub struct TrustTracker {
    config: TrustConfig,

    /// Active component weights; swapped whole by the feedback loop
    weights: StdRwLock<TrustWeights>,

    /// agent id -> serialized history
    agents: RwLock<HashMap<String, Arc<Mutex<AgentHistory>>>>,
}

impl TrustTracker {
    /// Create a tracker with default configuration and standard weights
    pub fn new() -> Self {
        Self::with_config(TrustConfig::default())
    }

    /// Create a tracker with custom configuration
    pub fn with_config(config: TrustConfig) -> Self {
        Self {
            config,
            weights: StdRwLock::new(TrustWeights::standard()),
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Currently active component weights
    pub fn weights(&self) -> TrustWeights {
        *self.weights.read().unwrap()
    }

    /// Swap in a new validated weight vector
    pub fn set_weights(&self, weights: TrustWeights) -> Result<()> {
        weights.validate()?;
        *self.weights.write().unwrap() = weights;
        Ok(())
    }

    /// Record an interaction outcome for an agent
    ///
    /// Appends a snapshot and returns the updated score. Calls for the
    /// same agent serialize on the per-agent mutex; no update is lost
    /// under concurrent feedback.
    pub async fn record_outcome(
        &self,
        agent_id: &str,
        components: TrustComponents,
    ) -> TrustScore {
        let history = self.history_for(agent_id).await;
        let mut history = history.lock().await;

        let weights = self.weights();
        let snapshot = TrustSnapshot {
            components: components.clamped(),
            value: weights.score(&components),
            recorded_at: Utc::now(),
        };
        history.snapshots.push(snapshot);
        // Fresh data clears any stale mark
        history.stale = false;

        self.score_from(agent_id, &history, Utc::now())
    }

    /// Current trust score for an agent
    pub async fn get_score(&self, agent_id: &str) -> Result<TrustScore> {
        let agents = self.agents.read().await;
        let history = agents
            .get(agent_id)
            .ok_or_else(|| EngineError::UnknownAgent {
                agent_id: agent_id.to_string(),
            })?
            .clone();
        drop(agents);

        let history = history.lock().await;
        if history.snapshots.is_empty() {
            return Err(EngineError::UnknownAgent {
                agent_id: agent_id.to_string(),
            });
        }
        Ok(self.score_from(agent_id, &history, Utc::now()))
    }

    /// Mark an agent's score stale after a persistence failure
    ///
    /// A stale score serves with halved confidence rather than being
    /// silently presented as fresh.
    pub async fn mark_stale(&self, agent_id: &str) {
        if let Some(history) = self.agents.read().await.get(agent_id).cloned() {
            history.lock().await.stale = true;
        }
    }

    /// Export an agent's history for persistence
    pub async fn export_history(&self, agent_id: &str) -> Result<Vec<TrustSnapshot>> {
        let agents = self.agents.read().await;
        let history = agents
            .get(agent_id)
            .ok_or_else(|| EngineError::UnknownAgent {
                agent_id: agent_id.to_string(),
            })?
            .clone();
        drop(agents);
        let snapshots = history.lock().await.snapshots.clone();
        Ok(snapshots)
    }

    /// Restore an agent's history from persisted snapshots
    pub async fn import_history(&self, agent_id: &str, snapshots: Vec<TrustSnapshot>) {
        let history = self.history_for(agent_id).await;
        let mut history = history.lock().await;
        history.snapshots = snapshots;
        history.stale = false;
    }

    /// Number of tracked agents
    pub async fn agent_count(&self) -> usize {
        self.agents.read().await.len()
    }

    async fn history_for(&self, agent_id: &str) -> Arc<Mutex<AgentHistory>> {
        if let Some(history) = self.agents.read().await.get(agent_id) {
            return history.clone();
        }
        let mut agents = self.agents.write().await;
        agents
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(AgentHistory::default())))
            .clone()
    }

    fn score_from(&self, agent_id: &str, history: &AgentHistory, now: DateTime<Utc>) -> TrustScore {
        let latest = history
            .snapshots
            .last()
            .expect("score_from requires a non-empty history");

        let age_days = (now - latest.recorded_at).num_seconds().max(0) as f64 / 86_400.0;
        let mut confidence = self.config.confidence(history.snapshots.len(), age_days);
        if history.stale {
            confidence /= 2.0;
        }

        TrustScore {
            agent_id: agent_id.to_string(),
            value: latest.value,
            confidence,
            trend: self.trend(&history.snapshots),
            sample_count: history.snapshots.len(),
            updated_at: latest.recorded_at,
            stale: history.stale,
        }
    }

    /// Least-squares slope of snapshot values over the trend window
    fn trend(&self, snapshots: &[TrustSnapshot]) -> f64 {
        let window = self.config.trend_window.max(2);
        let start = snapshots.len().saturating_sub(window);
        let recent = &snapshots[start..];
        let n = recent.len();
        if n < 2 {
            return 0.0;
        }

        let n_f = n as f64;
        let mean_x = (n_f - 1.0) / 2.0;
        let mean_y = recent.iter().map(|s| s.value).sum::<f64>() / n_f;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, snapshot) in recent.iter().enumerate() {
            let dx = i as f64 - mean_x;
            numerator += dx * (snapshot.value - mean_y);
            denominator += dx * dx;
        }
        if denominator == 0.0 {
            0.0
        } else {
            numerator / denominator
        }
    }
}

impl Default for TrustTracker {
    fn default() -> Self {
        Self::new()
    }
}
