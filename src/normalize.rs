//! Label Normalizer
//!
//! Converts the free-form label emitted by the external classifier
//! (e.g. "Tomato___Early_blight") into a canonical disease id, or the
//! terminal Healthy / NotALeaf outcomes. Pure function over
//! [`NormalizerConfig`] data; unparseable input degrades to a synthesized
//! id so a label always resolves to *something* the caller can act on.

use serde::{Deserialize, Serialize};

/// Result of normalizing a raw classifier label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedLabel {
    /// No disease; no treatment lookup happens
    Healthy,
    /// Input rejected by label heuristics (distinct from an unknown disease)
    NotALeaf,
    /// Canonical or synthesized disease id
    Disease(String),
}

/// One entry of the external-label to canonical-id mapping table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMapping {
    pub pattern: String,
    pub disease_id: String,
}

impl LabelMapping {
    pub fn new(pattern: impl Into<String>, disease_id: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            disease_id: disease_id.into(),
        }
    }
}

/// Configuration data driving [`Normalizer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Tokens that mark the input as not being a leaf photo at all
    pub rejection_tokens: Vec<String>,
    /// Token that marks a healthy leaf (terminal, no diagnosis)
    pub healthy_token: String,
    /// Compound delimiter between the subject and condition segments
    pub delimiter: String,
    /// Pattern table consulted before falling back to id synthesis
    pub mappings: Vec<LabelMapping>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            rejection_tokens: vec![
                "not".to_string(),
                "background".to_string(),
                "invalid".to_string(),
            ],
            healthy_token: "healthy".to_string(),
            delimiter: "___".to_string(),
            mappings: vec![
                LabelMapping::new("tomato___early_blight", "tomato-early-blight"),
                LabelMapping::new("tomato___late_blight", "tomato-late-blight"),
                LabelMapping::new("potato___early_blight", "potato-early-blight"),
                LabelMapping::new("potato___late_blight", "potato-late-blight"),
                LabelMapping::new("corn___common_rust", "corn-common-rust"),
                LabelMapping::new("apple___apple_scab", "apple-scab"),
                LabelMapping::new("grape___black_rot", "grape-black-rot"),
                LabelMapping::new("pepper___bacterial_spot", "pepper-bacterial-spot"),
            ],
        }
    }
}

/// Maps raw classifier labels onto the catalog's id space
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a raw label into Healthy, NotALeaf or a disease id.
    ///
    /// Matching order: rejection tokens, healthy token, mapping table
    /// (separator-normalized substring match), then fallback synthesis.
    pub fn normalize(&self, raw_label: &str) -> NormalizedLabel {
        let label = raw_label.trim().to_lowercase();

        if self
            .config
            .rejection_tokens
            .iter()
            .any(|token| label.contains(token.as_str()))
        {
            return NormalizedLabel::NotALeaf;
        }

        if label.contains(self.config.healthy_token.as_str()) {
            return NormalizedLabel::Healthy;
        }

        let spaced_label = flatten_separators(&label);
        for mapping in &self.config.mappings {
            let spaced_pattern = flatten_separators(&mapping.pattern.to_lowercase());
            if spaced_label.contains(&spaced_pattern) {
                return NormalizedLabel::Disease(mapping.disease_id.clone());
            }
        }

        NormalizedLabel::Disease(self.synthesize_id(&label))
    }

    /// Best-effort id for labels outside the mapping table: split on the
    /// delimiter into subject and condition and kebab-case both halves.
    fn synthesize_id(&self, label: &str) -> String {
        match label.split_once(self.config.delimiter.as_str()) {
            Some((subject, condition)) => format!("{}-{}", kebab(subject), kebab(condition)),
            None => kebab(label),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

/// Replace underscore/whitespace runs with single spaces for substring
/// comparison ("tomato___early_blight" -> "tomato early blight")
fn flatten_separators(text: &str) -> String {
    text.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Kebab-case a segment: underscore/whitespace runs become single hyphens
fn kebab(text: &str) -> String {
    text.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
