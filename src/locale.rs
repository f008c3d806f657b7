//! Display language selection and bilingual text containers.
//!
//! All farmer-facing reference text is carried in English/Kannada pairs;
//! the selected language only picks which side of the pair is shown and
//! never affects diagnosis or ranking.

use serde::{Deserialize, Serialize};

/// Store key for the persisted language preference
pub const STORE_KEY: &str = "locale";

/// Display language for catalog text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Kn,
}

impl Language {
    /// Two-letter code used in persisted state
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Kn => "kn",
        }
    }
}

/// English/Kannada text pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bilingual {
    pub en: String,
    pub kn: String,
}

impl Bilingual {
    pub fn new(en: impl Into<String>, kn: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            kn: kn.into(),
        }
    }

    /// Same text on both sides (used when no translation exists,
    /// e.g. a raw classifier label in the placeholder disease)
    pub fn untranslated(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            en: text.clone(),
            kn: text,
        }
    }

    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Kn => &self.kn,
        }
    }
}

/// English/Kannada list pair (symptoms, prevention tips)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualList {
    pub en: Vec<String>,
    pub kn: Vec<String>,
}

impl BilingualList {
    pub fn new(en: Vec<String>, kn: Vec<String>) -> Self {
        Self { en, kn }
    }

    pub fn get(&self, language: Language) -> &[String] {
        match language {
            Language::En => &self.en,
            Language::Kn => &self.kn,
        }
    }
}
