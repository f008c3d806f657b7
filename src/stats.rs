//! Session Statistics
//!
//! Cumulative analyzed / healthy / diseased counters, persisted across
//! restarts. Every outcome that consumed a classifier response counts as
//! analyzed, including rejections; transport failures that never produced
//! a parseable result count nothing. Updates are mutex-guarded
//! read-modify-writes so rapid concurrent triggers cannot lose increments.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::store::KvStore;

/// Store key for the persisted counters
pub const STORE_KEY: &str = "stats";

/// What a completed classification resolved to, for counting purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    /// The classifier responded but no diagnosis was surfaced
    /// (not-a-leaf, low confidence)
    Analyzed,
    Healthy,
    Diseased,
}

/// Monotone counters across all analyses on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionCounters {
    pub analyzed: u64,
    pub healthy: u64,
    pub diseased: u64,
}

impl SessionCounters {
    /// Fraction of analyses that came back healthy, 0 before any analysis
    pub fn healthy_rate(&self) -> f64 {
        if self.analyzed == 0 {
            0.0
        } else {
            self.healthy as f64 / self.analyzed as f64
        }
    }

    /// Fraction of analyses that produced a diagnosis
    pub fn diseased_rate(&self) -> f64 {
        if self.analyzed == 0 {
            0.0
        } else {
            self.diseased as f64 / self.analyzed as f64
        }
    }
}

/// Persisted counter state with atomic-per-update semantics
pub struct StatsTracker {
    store: Arc<dyn KvStore>,
    counters: Mutex<SessionCounters>,
}

impl StatsTracker {
    /// Load persisted counters, or start from zero. Malformed state
    /// degrades to zero with a warning.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let counters = match store.get(STORE_KEY) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(counters) => counters,
                Err(e) => {
                    warn!(error = %e, "Persisted counters are malformed, starting from zero");
                    SessionCounters::default()
                }
            },
            Ok(None) => SessionCounters::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read counters, starting from zero");
                SessionCounters::default()
            }
        };
        Self {
            store,
            counters: Mutex::new(counters),
        }
    }

    /// Record one completed classification and persist the counters.
    /// Returns the updated values.
    pub fn record_outcome(&self, kind: AnalysisKind) -> Result<SessionCounters> {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.analyzed += 1;
        match kind {
            AnalysisKind::Analyzed => {}
            AnalysisKind::Healthy => counters.healthy += 1,
            AnalysisKind::Diseased => counters.diseased += 1,
        }
        self.store
            .set(STORE_KEY, serde_json::to_value(*counters)?)?;
        Ok(*counters)
    }

    pub fn counters(&self) -> SessionCounters {
        *self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }
}
