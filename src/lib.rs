//! Leaf disease diagnosis and adaptive treatment ranking engine.
//!
//! Library core behind a farmer-facing plant doctor app: an external
//! service classifies a leaf photo, this crate turns the raw label into a
//! diagnosis and orders the treatments by blending catalog success rates
//! with accumulated user feedback. Capture, upload, rendering and speech
//! are external collaborators; they talk to [`engine::AdvisorEngine`]
//! and the [`store::KvStore`] persistence seam only.

pub mod activity_log;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod feedback;
pub mod gate;
pub mod locale;
pub mod normalize;
pub mod plan;
pub mod ranking;
pub mod stats;
pub mod store;

mod engine_tests;

pub use catalog::{Catalog, Disease, Severity, Treatment, TreatmentKind};
pub use classifier::{ClassifierError, ClassifierVerdict, HttpClassifier, LeafClassifier, LeafImage};
pub use config::AdvisorConfig;
pub use engine::{AdvisorEngine, AnalysisError, AnalysisOutcome, FeedbackAck};
pub use feedback::{Feedback, FeedbackLedger, FeedbackStats};
pub use gate::RejectReason;
pub use locale::{Bilingual, BilingualList, Language};
pub use normalize::{NormalizedLabel, Normalizer, NormalizerConfig};
pub use plan::{PlanState, PlanTransition, TreatmentPlan};
pub use stats::{AnalysisKind, SessionCounters, StatsTracker};
pub use store::{JsonFileStore, KvStore, MemoryStore};
