//! Disease Catalog
//!
//! Static reference data: diseases, their symptoms and their treatments,
//! with bilingual text and an a-priori success rate per treatment. Loaded
//! once at startup from embedded JSON and never mutated afterwards.
//!
//! When a classifier label resolves to an id the catalog does not know,
//! the caller builds a generic placeholder disease instead of failing;
//! the user always gets *some* guidance, escalating to expert consultation.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::locale::{Bilingual, BilingualList};

/// Embedded reference data, kept in sync with the normalizer mapping table
const CATALOG_JSON: &str = include_str!("../data/catalog.json");

static BUILTIN: OnceLock<Catalog> = OnceLock::new();

/// Disease severity grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Organic vs chemical treatment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentKind {
    Organic,
    Chemical,
}

/// A remedy entry belonging to one disease.
///
/// `success_rate` is an a-priori efficacy estimate in [0, 100]; observed
/// user feedback is blended with it at ranking time, never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub id: String,
    pub kind: TreatmentKind,
    pub name: Bilingual,
    pub dosage: Bilingual,
    pub application: Bilingual,
    pub prevention_tips: BilingualList,
    pub success_rate: f64,
}

/// A catalog entry describing a plant condition and its treatments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub id: String,
    pub name: Bilingual,
    pub scientific_name: String,
    pub severity: Severity,
    pub description: Bilingual,
    pub symptoms: BilingualList,
    pub treatments: Vec<Treatment>,
}

/// Read-only disease reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    diseases: Vec<Disease>,
}

impl Catalog {
    /// The embedded catalog, parsed once per process
    pub fn builtin() -> &'static Catalog {
        BUILTIN.get_or_init(|| {
            serde_json::from_str(CATALOG_JSON).expect("embedded catalog data is valid")
        })
    }

    /// Parse a catalog from JSON (custom or test data)
    pub fn from_json(json: &str) -> Result<Catalog, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn lookup(&self, id: &str) -> Option<&Disease> {
        self.diseases.iter().find(|d| d.id == id)
    }

    pub fn diseases(&self) -> &[Disease] {
        &self.diseases
    }

    /// Generic disease shown when the classifier names a condition the
    /// catalog has no entry for. Severity defaults to medium and the
    /// single zero-rate organic treatment advises expert consultation.
    pub fn placeholder(id: &str, display_name: &str) -> Disease {
        Disease {
            id: id.to_string(),
            name: Bilingual::untranslated(display_name),
            scientific_name: display_name.to_string(),
            severity: Severity::Medium,
            description: Bilingual::new(
                format!("Detected disease: {display_name}"),
                format!("ಪತ್ತೆಯಾಗಿದೆ: {display_name}"),
            ),
            symptoms: BilingualList::new(
                vec!["Visible damage on leaf".to_string()],
                vec!["ಎಲೆಯಲ್ಲಿ ಗೋಚರ ಹಾನಿ".to_string()],
            ),
            treatments: vec![Treatment {
                id: "consult-expert".to_string(),
                kind: TreatmentKind::Organic,
                name: Bilingual::new("Consult Expert", "ತಜ್ಞರನ್ನು ಸಂಪರ್ಕಿಸಿ"),
                dosage: Bilingual::new("N/A", "N/A"),
                application: Bilingual::new(
                    "Please consult with an agricultural expert for treatment recommendations.",
                    "ಚಿಕಿತ್ಸೆಯ ಶಿಫಾರಸುಗಳಿಗಾಗಿ ಕೃಷಿ ತಜ್ಞರನ್ನು ಸಂಪರ್ಕಿಸಿ.",
                ),
                prevention_tips: BilingualList::new(
                    vec!["Contact local agricultural extension office".to_string()],
                    vec!["ಸ್ಥಳೀಯ ಕೃಷಿ ವಿಸ್ತರಣ ಕಛೇರಿಯನ್ನು ಸಂಪರ್ಕಿಸಿ".to_string()],
                ),
                success_rate: 0.0,
            }],
        }
    }
}
