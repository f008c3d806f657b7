//! Analysis orchestration
//!
//! [`AdvisorEngine`] drives one analysis request end to end: the
//! classifier call (the only suspending step), then the leaf and healthy
//! checks, the confidence gate, disease resolution and treatment ranking,
//! handing a typed [`AnalysisOutcome`] to the presentation layer.
//! Feedback closes the loop through
//! [`record_feedback`](AdvisorEngine::record_feedback), which future
//! rankings consume.
//!
//! At most one analysis is in flight per engine; a second trigger while
//! one is pending is a no-op ([`AnalysisError::Busy`]), and a verdict
//! arriving after [`reset`](AdvisorEngine::reset) is discarded so a stale
//! response never overwrites newer state.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use crate::activity_log;
use crate::catalog::{Catalog, Disease, Treatment};
use crate::classifier::{ClassifierError, ClassifierVerdict, LeafClassifier, LeafImage};
use crate::config::AdvisorConfig;
use crate::feedback::{FeedbackLedger, FeedbackStats};
use crate::gate::{self, GateDecision, RejectReason};
use crate::locale::{self, Language};
use crate::normalize::{NormalizedLabel, Normalizer};
use crate::plan::{PlanTransition, TreatmentPlan};
use crate::ranking;
use crate::stats::{AnalysisKind, SessionCounters, StatsTracker};
use crate::store::KvStore;

/// Result of one analysis, handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// The leaf is healthy; no treatment needed
    Healthy,
    /// No diagnosis was surfaced; the user should retake the photo
    Rejected { reason: RejectReason },
    /// A diagnosis with treatments ordered by the adaptive ranker
    Diagnosis {
        disease: Disease,
        ranked_treatments: Vec<Treatment>,
    },
}

/// Why an analysis produced no outcome at all
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Another analysis is pending; this trigger was a no-op
    #[error("an analysis is already in flight")]
    Busy,

    /// The engine was reset while the verdict was in flight
    #[error("analysis superseded by a newer request")]
    Superseded,

    /// The classifier never produced a parseable result. Statistics are
    /// not updated on this path.
    #[error("classifier unavailable: {0}")]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// What recording feedback did to the active treatment plan
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackAck {
    /// Stored in the ledger; no active plan was affected
    Recorded,
    /// Negative feedback advanced the plan to this treatment
    NextTreatment(Treatment),
    /// Positive feedback settled the plan
    Settled,
    /// Negative feedback on the last treatment; advise expert consultation
    PlanExhausted,
}

/// Diagnosis-to-treatment resolution and adaptive ranking engine
pub struct AdvisorEngine {
    config: AdvisorConfig,
    catalog: Catalog,
    normalizer: Normalizer,
    classifier: Arc<dyn LeafClassifier>,
    ledger: FeedbackLedger,
    stats: StatsTracker,
    store: Arc<dyn KvStore>,
    plan: Mutex<Option<TreatmentPlan>>,
    language: Mutex<Language>,
    in_flight: AtomicBool,
    generation: AtomicU64,
}

impl AdvisorEngine {
    /// Engine over the built-in catalog
    pub fn new(
        config: AdvisorConfig,
        classifier: Arc<dyn LeafClassifier>,
        store: Arc<dyn KvStore>,
    ) -> Self {
        Self::with_catalog(config, classifier, store, Catalog::builtin().clone())
    }

    pub fn with_catalog(
        config: AdvisorConfig,
        classifier: Arc<dyn LeafClassifier>,
        store: Arc<dyn KvStore>,
        catalog: Catalog,
    ) -> Self {
        let language = match store.get(locale::STORE_KEY) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Language::default(),
        };
        Self {
            normalizer: Normalizer::new(config.normalizer.clone()),
            ledger: FeedbackLedger::load(store.clone()),
            stats: StatsTracker::load(store.clone()),
            config,
            catalog,
            classifier,
            store,
            plan: Mutex::new(None),
            language: Mutex::new(language),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Run one analysis. The classifier call is the only suspending step;
    /// everything after it is synchronous resolution.
    pub async fn analyze(&self, image: &LeafImage) -> Result<AnalysisOutcome, AnalysisError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(AnalysisError::Busy);
        }
        let generation = self.generation.load(Ordering::SeqCst);
        let analysis_id = Uuid::new_v4().to_string();
        activity_log::log_analysis_start(&analysis_id);

        let result = self.classifier.classify(image).await;
        self.in_flight.store(false, Ordering::SeqCst);

        let verdict = match result {
            Ok(verdict) => verdict,
            Err(e) => {
                activity_log::log_classifier_failure(&analysis_id, &e.to_string());
                return Err(e.into());
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            activity_log::log_analysis_superseded(&analysis_id);
            return Err(AnalysisError::Superseded);
        }

        self.resolve(&analysis_id, verdict)
    }

    /// Resolve a verdict into an outcome. Check order: not-a-leaf, then
    /// healthy, then the confidence gate, then disease resolution; the
    /// gate only guards the diagnosis path so rejections keep their more
    /// specific message.
    fn resolve(
        &self,
        analysis_id: &str,
        verdict: ClassifierVerdict,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if !verdict.is_leaf {
            return self.reject(analysis_id, &verdict, RejectReason::NotALeaf);
        }
        if verdict.is_healthy {
            return self.mark_healthy(analysis_id, &verdict);
        }

        match self.normalizer.normalize(&verdict.label) {
            NormalizedLabel::NotALeaf => self.reject(analysis_id, &verdict, RejectReason::NotALeaf),
            NormalizedLabel::Healthy => self.mark_healthy(analysis_id, &verdict),
            NormalizedLabel::Disease(disease_id) => {
                if let GateDecision::Rejected(reason) =
                    gate::admit(verdict.confidence, self.config.confidence_threshold)
                {
                    return self.reject(analysis_id, &verdict, reason);
                }
                self.diagnose(analysis_id, &verdict, disease_id)
            }
        }
    }

    fn reject(
        &self,
        analysis_id: &str,
        verdict: &ClassifierVerdict,
        reason: RejectReason,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let counters = self.stats.record_outcome(AnalysisKind::Analyzed)?;
        activity_log::log_analysis_outcome(analysis_id, "rejected", &verdict.label, verdict.confidence);
        activity_log::log_counters(counters.analyzed, counters.healthy, counters.diseased);
        Ok(AnalysisOutcome::Rejected { reason })
    }

    fn mark_healthy(
        &self,
        analysis_id: &str,
        verdict: &ClassifierVerdict,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let counters = self.stats.record_outcome(AnalysisKind::Healthy)?;
        *self.plan.lock().unwrap_or_else(|e| e.into_inner()) = None;
        activity_log::log_analysis_outcome(analysis_id, "healthy", &verdict.label, verdict.confidence);
        activity_log::log_counters(counters.analyzed, counters.healthy, counters.diseased);
        Ok(AnalysisOutcome::Healthy)
    }

    fn diagnose(
        &self,
        analysis_id: &str,
        verdict: &ClassifierVerdict,
        disease_id: String,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let (disease, from_catalog) = match self.catalog.lookup(&disease_id) {
            Some(disease) => (disease.clone(), true),
            None => (
                Catalog::placeholder(&disease_id, verdict.label.trim()),
                false,
            ),
        };

        let ranked = ranking::rank(&disease, &self.ledger.entries());
        let counters = self.stats.record_outcome(AnalysisKind::Diseased)?;
        *self.plan.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(TreatmentPlan::new(&disease.id, ranked.clone()));

        activity_log::log_analysis_outcome(analysis_id, "diagnosis", &verdict.label, verdict.confidence);
        activity_log::log_diagnosis(analysis_id, &disease.id, from_catalog, ranked.len());
        activity_log::log_counters(counters.analyzed, counters.healthy, counters.diseased);

        Ok(AnalysisOutcome::Diagnosis {
            disease,
            ranked_treatments: ranked,
        })
    }

    /// Record a usefulness judgment. The entry always lands in the
    /// ledger, even for ids no longer in the catalog; the plan cursor
    /// only moves when the feedback targets the treatment currently
    /// shown for the active diagnosis.
    pub fn record_feedback(
        &self,
        disease_id: &str,
        treatment_id: &str,
        is_useful: bool,
    ) -> anyhow::Result<FeedbackAck> {
        self.ledger.record(disease_id, treatment_id, is_useful)?;
        activity_log::log_feedback_recorded(disease_id, treatment_id, is_useful, self.ledger.len());

        let mut plan = self.plan.lock().unwrap_or_else(|e| e.into_inner());
        let transition = plan.as_mut().and_then(|p| {
            if p.disease_id() == disease_id {
                p.apply_feedback(treatment_id, is_useful)
            } else {
                None
            }
        });

        Ok(match transition {
            Some(PlanTransition::Advanced(next)) => {
                activity_log::log_plan_transition(disease_id, "advanced");
                FeedbackAck::NextTreatment(next)
            }
            Some(PlanTransition::Settled) => {
                activity_log::log_plan_transition(disease_id, "settled");
                FeedbackAck::Settled
            }
            Some(PlanTransition::Exhausted) => {
                activity_log::log_plan_transition(disease_id, "exhausted");
                FeedbackAck::PlanExhausted
            }
            None => FeedbackAck::Recorded,
        })
    }

    /// The treatment currently shown for the active diagnosis, if any
    pub fn current_treatment(&self) -> Option<Treatment> {
        self.plan
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(|p| p.current().cloned())
    }

    /// Advance to the next ranked treatment without recording feedback
    pub fn show_alternative(&self) -> Option<Treatment> {
        self.plan
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_mut()
            .and_then(|p| p.skip_to_next().cloned())
    }

    /// Abandon the current diagnosis and invalidate any in-flight verdict
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.plan.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn counters(&self) -> SessionCounters {
        self.stats.counters()
    }

    pub fn feedback_stats(&self, treatment_id: &str) -> FeedbackStats {
        self.ledger.stats_for(treatment_id)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn language(&self) -> Language {
        *self.language.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Change and persist the display language
    pub fn set_language(&self, language: Language) -> anyhow::Result<()> {
        self.store
            .set(locale::STORE_KEY, serde_json::to_value(language)?)?;
        *self.language.lock().unwrap_or_else(|e| e.into_inner()) = language;
        Ok(())
    }
}
