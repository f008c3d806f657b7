//! External classifier contract
//!
//! The image classifier is an external collaborator: the engine only
//! depends on the [`LeafClassifier`] trait and the logical request/response
//! contract (image bytes in, label + confidence out). [`HttpClassifier`]
//! is the bundled implementation speaking the detection service's JSON
//! protocol. Timeout and retry policy belong to the transport; every
//! failure surfaces as a typed [`ClassifierError`] the engine maps to a
//! service-unavailable outcome without touching statistics.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default timeout for a single classification request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A captured leaf photo, as raw bytes or an already-encoded data URI
#[derive(Debug, Clone)]
pub enum LeafImage {
    Bytes(Vec<u8>),
    DataUri(String),
}

impl LeafImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        LeafImage::Bytes(bytes)
    }

    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        LeafImage::DataUri(uri.into())
    }

    /// Data-URI form of the image, as the detection service expects.
    /// Raw bytes are assumed to be JPEG.
    pub fn to_data_uri(&self) -> String {
        match self {
            LeafImage::Bytes(bytes) => {
                format!("data:image/jpeg;base64,{}", BASE64.encode(bytes))
            }
            LeafImage::DataUri(uri) => uri.clone(),
        }
    }
}

/// Classification result from the external model service.
///
/// `is_leaf` / `is_healthy` are upstream heuristics; services that only
/// return a label leave them at their defaults and the label normalizer
/// decides instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub label: String,
    pub confidence: f64,
    #[serde(default = "default_is_leaf", alias = "isLeaf")]
    pub is_leaf: bool,
    #[serde(default, alias = "isHealthy")]
    pub is_healthy: bool,
}

fn default_is_leaf() -> bool {
    true
}

impl ClassifierVerdict {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            is_leaf: true,
            is_healthy: false,
        }
    }
}

/// Why a classification call produced no verdict
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier service unreachable: {0}")]
    Unreachable(String),

    #[error("classifier request timed out")]
    Timeout,

    #[error("classifier returned status {0}")]
    Status(u16),

    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("invalid classifier endpoint: {0}")]
    InvalidEndpoint(String),
}

/// External classification service seam
#[async_trait]
pub trait LeafClassifier: Send + Sync {
    async fn classify(&self, image: &LeafImage) -> Result<ClassifierVerdict, ClassifierError>;
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    #[serde(rename = "imageData")]
    image_data: &'a str,
}

/// HTTP client for the detection service's POST /detect endpoint
#[derive(Debug)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    /// Create a client with the default request timeout. The endpoint URL
    /// is validated up front so a misconfiguration fails at construction,
    /// not mid-analysis.
    pub fn new(endpoint: &str) -> Result<Self, ClassifierError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, ClassifierError> {
        let cleaned = endpoint.trim_end_matches('/');
        let parsed = reqwest::Url::parse(cleaned)
            .map_err(|e| ClassifierError::InvalidEndpoint(format!("{cleaned}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClassifierError::InvalidEndpoint(format!(
                "{cleaned}: scheme must be http or https"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: cleaned.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LeafClassifier for HttpClassifier {
    async fn classify(&self, image: &LeafImage) -> Result<ClassifierVerdict, ClassifierError> {
        let data_uri = image.to_data_uri();
        let request = DetectRequest {
            image_data: &data_uri,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout
                } else {
                    ClassifierError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Classifier returned an error status");
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let mut verdict: ClassifierVerdict = response
            .json()
            .await
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;
        verdict.confidence = verdict.confidence.clamp(0.0, 1.0);

        debug!(
            label = %verdict.label,
            confidence = verdict.confidence,
            is_leaf = verdict.is_leaf,
            "Classifier verdict received"
        );
        Ok(verdict)
    }
}
