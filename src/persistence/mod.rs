//! Narrow persistence interface for trust history and ledger state
//!
//! The engine consumes a key-value shaped store through this trait; the
//! concrete backend is external. Writes are retried with bounded,
//! jittered exponential backoff; a write that still fails marks the
//! affected trust score stale instead of silently serving it as fresh.

use crate::budget::LedgerState;
use crate::errors::{EngineError, Result};
use crate::trust::TrustSnapshot;
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Maximum write attempts, initial try included
const MAX_ATTEMPTS: u32 = 3;

/// Base backoff delay between attempts
const BASE_BACKOFF_MS: u64 = 50;

/// Key-value shaped store for engine state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Persist an agent's trust history
    async fn save_trust_history(&self, agent_id: &str, history: &[TrustSnapshot]) -> Result<()>;

    /// Load an agent's trust history, if present
    async fn load_trust_history(&self, agent_id: &str) -> Result<Option<Vec<TrustSnapshot>>>;

    /// Persist ledger state
    async fn save_ledger(&self, state: &LedgerState) -> Result<()>;

    /// Load ledger state, if present
    async fn load_ledger(&self) -> Result<Option<LedgerState>>;
}

/// Retry an async write with jittered exponential backoff
///
/// Attempts: 1 + 2 retries (50ms, 100ms base delays plus up to 25ms
/// jitter). Returns the final error wrapped as `Persistence` when all
/// attempts fail.
pub async fn with_retries<F, Fut>(operation: F) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let mut last_error = String::new();
    for attempt in 1..=MAX_ATTEMPTS {
        match operation().await {
            Ok(()) => return Ok(()),
            Err(err) => {
                last_error = err.to_string();
                if attempt < MAX_ATTEMPTS {
                    let backoff = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                    let jitter = rand::thread_rng().gen_range(0..=BASE_BACKOFF_MS / 2);
                    tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
                }
            }
        }
    }
    Err(EngineError::Persistence {
        attempts: MAX_ATTEMPTS,
        reason: last_error,
    })
}

/// In-memory store for tests and embedded use
#[derive(Debug, Default)]
pub struct InMemoryStore {
    trust: Mutex<HashMap<String, Vec<TrustSnapshot>>>,
    ledger: Mutex<Option<LedgerState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn save_trust_history(&self, agent_id: &str, history: &[TrustSnapshot]) -> Result<()> {
        self.trust
            .lock()
            .unwrap()
            .insert(agent_id.to_string(), history.to_vec());
        Ok(())
    }

    async fn load_trust_history(&self, agent_id: &str) -> Result<Option<Vec<TrustSnapshot>>> {
        Ok(self.trust.lock().unwrap().get(agent_id).cloned())
    }

    async fn save_ledger(&self, state: &LedgerState) -> Result<()> {
        *self.ledger.lock().unwrap() = Some(state.clone());
        Ok(())
    }

    async fn load_ledger(&self) -> Result<Option<LedgerState>> {
        Ok(self.ledger.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::TrustComponents;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn snapshot(value: f64) -> TrustSnapshot {
        TrustSnapshot {
            components: TrustComponents::uniform(value / 5.0),
            value,
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_trust_roundtrip() {
        let store = InMemoryStore::new();
        let history = vec![snapshot(3.5), snapshot(4.0)];
        store.save_trust_history("agent-1", &history).await.unwrap();

        let loaded = store.load_trust_history("agent-1").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].value, 4.0);

        assert!(store.load_trust_history("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_ledger_roundtrip() {
        let store = InMemoryStore::new();
        assert!(store.load_ledger().await.unwrap().is_none());

        let state = LedgerState {
            daily_budget: 100.0,
            current_usage: 42.5,
        };
        store.save_ledger(&state).await.unwrap();
        assert_eq!(store.load_ledger().await.unwrap().unwrap(), state);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retries(|| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(EngineError::NluError("transient".to_string()))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result = with_retries(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EngineError::NluError("permanent".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(EngineError::Persistence { attempts, reason }) => {
                assert_eq!(attempts, 3);
                assert!(reason.contains("permanent"));
            }
            other => panic!("expected Persistence error, got {other:?}"),
        }
    }
}
