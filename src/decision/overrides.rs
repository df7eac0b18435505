//! Manual override registry
//!
//! Conflict policy: the most recently authorized, non-expired override for
//! a scope wins; older overlapping overrides are superseded and reported.

use crate::decision::types::{ManualOverride, OverrideAck};
use crate::errors::{EngineError, Result};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Registry of manual overrides
#[derive(Debug, Default)]
pub struct OverrideRegistry {
    entries: Mutex<Vec<ManualOverride>>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override
    ///
    /// Already-expired overrides are rejected. Returns the reasons of any
    /// overlapping-scope overrides this one supersedes, for audit logging.
    pub fn apply(&self, directive: ManualOverride) -> Result<(OverrideAck, Vec<String>)> {
        let now = Utc::now();
        if !directive.is_active(now) {
            return Err(EngineError::OverrideRejected(format!(
                "expired at {} before application",
                directive.expires_at
            )));
        }

        let mut entries = self.entries.lock().unwrap();
        let superseded = entries
            .iter()
            .filter(|existing| {
                existing.is_active(now)
                    && scope_overlaps(existing, &directive)
                    && existing.authorized_at <= directive.authorized_at
            })
            .map(|existing| existing.reason.clone())
            .collect();

        let ack = OverrideAck {
            accepted: true,
            expires_at: directive.expires_at,
        };
        entries.push(directive);

        Ok((ack, superseded))
    }

    /// Resolve the winning override for a user at `now`
    pub fn resolve(&self, user_id: &str, now: DateTime<Utc>) -> Option<ManualOverride> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter(|o| o.is_active(now) && o.applies_to(user_id))
            .max_by_key(|o| o.authorized_at)
            .cloned()
    }

    /// Drop expired entries; returns how many were removed
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|o| o.is_active(now));
        before - entries.len()
    }

    /// Number of registered overrides, expired included
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn scope_overlaps(a: &ManualOverride, b: &ManualOverride) -> bool {
    match (&a.user_id, &b.user_id) {
        (Some(a_user), Some(b_user)) => a_user == b_user,
        // A global override overlaps every scope
        _ => true,
    }
}
