//! Activity Logging Module
//!
//! Structured event logging for auditing and debugging.
//!
//! What IS logged:
//! - Analysis IDs, disease/treatment IDs
//! - Classifier labels, confidence values and outcomes
//! - Counter values and log sizes
//! - Error messages
//!
//! What is NOT logged:
//! - Image payloads or data URIs
//! - Any free-text the user enters

use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Guard that must be held for the duration of the application
/// to ensure logs are flushed before exit
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize the activity logging system
///
/// Sets up dual logging:
/// - Console output (human-readable, for development)
/// - File output (JSON, for auditing and analysis)
///
/// Log files are stored in ~/.leafadvisor/logs/ with daily rotation
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "activity.log");

    // Non-blocking writer for file output
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    // File layer - JSON format with explicit UTC timestamps
    let file_layer = fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(non_blocking)
        .with_target(true);

    // Console layer - human-readable format
    let console_layer = fmt::layer().with_target(true).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    info!(
        event = "logging_initialized",
        log_dir = %log_dir.display(),
        "Activity logging system initialized"
    );

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(".leafadvisor").join("logs"))
}

// ============================================================================
// Analysis Events
// ============================================================================

/// Log analysis start (image content itself is never logged)
pub fn log_analysis_start(analysis_id: &str) {
    info!(
        event = "analysis_start",
        analysis_id = %analysis_id,
        "Leaf analysis started"
    );
}

/// Log a surfaced analysis outcome
pub fn log_analysis_outcome(analysis_id: &str, outcome: &str, label: &str, confidence: f64) {
    info!(
        event = "analysis_outcome",
        analysis_id = %analysis_id,
        outcome = %outcome,
        label = %label,
        confidence = confidence,
        "Analysis completed"
    );
}

/// Log a diagnosis, including whether the catalog had the disease
pub fn log_diagnosis(analysis_id: &str, disease_id: &str, from_catalog: bool, treatment_count: usize) {
    info!(
        event = "diagnosis",
        analysis_id = %analysis_id,
        disease_id = %disease_id,
        from_catalog = from_catalog,
        treatment_count = treatment_count,
        "Diagnosis produced"
    );
}

/// Log a classifier failure (no statistics are updated on this path)
pub fn log_classifier_failure(analysis_id: &str, error: &str) {
    warn!(
        event = "classifier_failure",
        analysis_id = %analysis_id,
        error = %error,
        "Classifier call failed"
    );
}

/// Log a stale verdict discarded after a reset
pub fn log_analysis_superseded(analysis_id: &str) {
    info!(
        event = "analysis_superseded",
        analysis_id = %analysis_id,
        "Stale analysis discarded"
    );
}

// ============================================================================
// Feedback Events
// ============================================================================

/// Log recorded feedback and the resulting ledger size
pub fn log_feedback_recorded(disease_id: &str, treatment_id: &str, is_useful: bool, ledger_len: usize) {
    info!(
        event = "feedback_recorded",
        disease_id = %disease_id,
        treatment_id = %treatment_id,
        is_useful = is_useful,
        ledger_len = ledger_len,
        "Treatment feedback recorded"
    );
}

/// Log plan cursor movement after feedback
pub fn log_plan_transition(disease_id: &str, transition: &str) {
    info!(
        event = "plan_transition",
        disease_id = %disease_id,
        transition = %transition,
        "Treatment plan advanced"
    );
}

// ============================================================================
// Statistics Events
// ============================================================================

/// Log counter values after an update
pub fn log_counters(analyzed: u64, healthy: u64, diseased: u64) {
    info!(
        event = "counters_updated",
        analyzed = analyzed,
        healthy = healthy,
        diseased = diseased,
        "Session counters updated"
    );
}
