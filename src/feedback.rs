//! Feedback Ledger
//!
//! Append-only log of per-treatment usefulness judgments. Corrections are
//! made by recording a new entry, never by mutating history; the full log
//! is persisted on every append under one mutex-guarded read-modify-write
//! so rapid double-taps cannot lose entries.
//!
//! Entries may reference disease/treatment ids that have since left the
//! catalog; they are stored and counted anyway and simply never surface
//! in a ranking.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::store::KvStore;

/// Store key for the persisted feedback log
pub const STORE_KEY: &str = "feedback";

/// A user's usefulness judgment on one treatment application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub disease_id: String,
    pub treatment_id: String,
    pub is_useful: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Aggregate counts for one treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FeedbackStats {
    pub positive: u64,
    pub total: u64,
}

/// Append-only feedback log backed by the key-value store
pub struct FeedbackLedger {
    store: Arc<dyn KvStore>,
    entries: Mutex<Vec<Feedback>>,
}

impl FeedbackLedger {
    /// Load the persisted log, or start empty. A malformed persisted log
    /// degrades to empty with a warning rather than failing startup.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let entries = match store.get(STORE_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<Vec<Feedback>>(value) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Persisted feedback log is malformed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read feedback log, starting empty");
                Vec::new()
            }
        };
        debug!(entry_count = entries.len(), "Feedback ledger loaded");
        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    /// Append a feedback entry and persist the full log
    pub fn record(&self, disease_id: &str, treatment_id: &str, is_useful: bool) -> Result<Feedback> {
        self.record_with_location(disease_id, treatment_id, is_useful, None)
    }

    pub fn record_with_location(
        &self,
        disease_id: &str,
        treatment_id: &str,
        is_useful: bool,
        location: Option<String>,
    ) -> Result<Feedback> {
        let entry = Feedback {
            disease_id: disease_id.to_string(),
            treatment_id: treatment_id.to_string(),
            is_useful,
            timestamp: Utc::now(),
            location,
        };

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(entry.clone());
        self.store
            .set(STORE_KEY, serde_json::to_value(&*entries)?)?;
        Ok(entry)
    }

    /// Positive/total counts for one treatment id
    pub fn stats_for(&self, treatment_id: &str) -> FeedbackStats {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut stats = FeedbackStats::default();
        for entry in entries.iter().filter(|f| f.treatment_id == treatment_id) {
            stats.total += 1;
            if entry.is_useful {
                stats.positive += 1;
            }
        }
        stats
    }

    /// Snapshot of the full log, oldest first
    pub fn entries(&self) -> Vec<Feedback> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
