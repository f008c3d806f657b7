//! Treatment Ranker
//!
//! Orders a disease's treatment list by a blended score of the catalog's
//! a-priori success rate and the observed positive-feedback rate. A
//! treatment with no feedback scores exactly `success_rate / 2`, so
//! catalog priors decide the order until evidence accumulates. The sort
//! is stable: equal scores keep catalog order.
//!
//! Ranking is pure over the feedback snapshot; it runs once per analysis
//! and never reorders a list already shown to the user (that is the
//! plan cursor's job, see [`crate::plan`]).

use std::cmp::Ordering;

use crate::catalog::{Disease, Treatment};
use crate::feedback::Feedback;

/// Blended score in [0, 100]: average of the catalog success rate and the
/// observed positive-feedback percentage (0 when no feedback exists).
pub fn blended_score(treatment: &Treatment, feedback: &[Feedback]) -> f64 {
    let mut positive = 0u64;
    let mut total = 0u64;
    for entry in feedback.iter().filter(|f| f.treatment_id == treatment.id) {
        total += 1;
        if entry.is_useful {
            positive += 1;
        }
    }
    let observed_pct = if total == 0 {
        0.0
    } else {
        positive as f64 / total as f64 * 100.0
    };
    (treatment.success_rate + observed_pct) / 2.0
}

/// Reorder a disease's treatments by descending blended score.
///
/// Always returns a permutation of `disease.treatments`: never adds,
/// drops or duplicates, and never reaches across disease boundaries.
pub fn rank(disease: &Disease, feedback: &[Feedback]) -> Vec<Treatment> {
    let mut scored: Vec<(f64, Treatment)> = disease
        .treatments
        .iter()
        .map(|t| (blended_score(t, feedback), t.clone()))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, t)| t).collect()
}
