//! Confidence Gate
//!
//! Threshold check on classifier certainty. A diagnosis is only surfaced
//! when confidence passes the gate; a rejected result maps to a
//! "retake photo" outcome upstream. The threshold lives in
//! [`crate::config::AdvisorConfig`], not at call sites.

use serde::{Deserialize, Serialize};

/// Why an analysis was rejected without a diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Classifier heuristics say the photo is not a plant leaf
    NotALeaf,
    /// Classifier certainty below the configured threshold
    LowConfidence,
}

/// Outcome of the confidence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Admitted,
    Rejected(RejectReason),
}

impl GateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateDecision::Admitted)
    }
}

/// Admit or reject a classification by confidence. Threshold inclusive:
/// a confidence exactly at the threshold is admitted.
pub fn admit(confidence: f64, threshold: f64) -> GateDecision {
    if confidence >= threshold {
        GateDecision::Admitted
    } else {
        GateDecision::Rejected(RejectReason::LowConfidence)
    }
}
