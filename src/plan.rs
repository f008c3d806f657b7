//! Per-diagnosis treatment plan cursor.
//!
//! After a diagnosis the ranked treatment list is walked with an explicit
//! index: negative feedback advances to the next untried treatment,
//! positive feedback settles the plan, and running past the last entry
//! exhausts it. The list itself is never re-sorted once shown; fresh
//! feedback only influences the *next* analysis through the ranker.

use serde::Serialize;

use crate::catalog::Treatment;

/// Lifecycle of an active treatment plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    /// A treatment is currently being shown
    Active,
    /// The user confirmed a treatment worked
    Settled,
    /// Every treatment was tried without success
    Exhausted,
}

/// What a feedback application did to the cursor
#[derive(Debug, Clone, PartialEq)]
pub enum PlanTransition {
    /// Moved on to this next-ranked treatment
    Advanced(Treatment),
    Settled,
    Exhausted,
}

/// Cursor over one diagnosis's ranked treatments
#[derive(Debug, Clone)]
pub struct TreatmentPlan {
    disease_id: String,
    treatments: Vec<Treatment>,
    cursor: usize,
    state: PlanState,
}

impl TreatmentPlan {
    pub fn new(disease_id: impl Into<String>, ranked: Vec<Treatment>) -> Self {
        let state = if ranked.is_empty() {
            PlanState::Exhausted
        } else {
            PlanState::Active
        };
        Self {
            disease_id: disease_id.into(),
            treatments: ranked,
            cursor: 0,
            state,
        }
    }

    pub fn disease_id(&self) -> &str {
        &self.disease_id
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    /// The treatment currently shown, None once the plan is exhausted
    pub fn current(&self) -> Option<&Treatment> {
        match self.state {
            PlanState::Exhausted => None,
            _ => self.treatments.get(self.cursor),
        }
    }

    /// Whether more untried treatments remain after the current one
    pub fn has_alternative(&self) -> bool {
        self.state == PlanState::Active && self.cursor + 1 < self.treatments.len()
    }

    /// Apply feedback for a treatment. Returns None when the plan is not
    /// active or the feedback targets something other than the treatment
    /// currently shown (late or orphaned feedback; the ledger still keeps
    /// it, the cursor just does not move).
    pub fn apply_feedback(&mut self, treatment_id: &str, is_useful: bool) -> Option<PlanTransition> {
        if self.state != PlanState::Active {
            return None;
        }
        let current_id = self.current().map(|t| t.id.clone())?;
        if current_id != treatment_id {
            return None;
        }

        if is_useful {
            self.state = PlanState::Settled;
            return Some(PlanTransition::Settled);
        }

        if self.cursor + 1 < self.treatments.len() {
            self.cursor += 1;
            Some(PlanTransition::Advanced(
                self.treatments[self.cursor].clone(),
            ))
        } else {
            self.state = PlanState::Exhausted;
            Some(PlanTransition::Exhausted)
        }
    }

    /// Advance to the next treatment without recording a judgment
    /// (the "show alternative treatment" action)
    pub fn skip_to_next(&mut self) -> Option<&Treatment> {
        if !self.has_alternative() {
            return None;
        }
        self.cursor += 1;
        self.treatments.get(self.cursor)
    }
}
