use serde::{Deserialize, Serialize};

use super::pill::CatalogEntry;

/// Maximum number of OCR fragments kept on a result for diagnostics.
pub const MAX_DETECTED_TEXTS: usize = 10;

/// Text returned by one OCR call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Dense full-document text (empty when the service returned none).
    pub full_text: String,
    /// Per-annotation fragments, in service order.
    pub fragments: Vec<String>,
}

impl RawDetection {
    pub fn new(full_text: impl Into<String>, fragments: Vec<String>) -> Self {
        Self {
            full_text: full_text.into(),
            fragments,
        }
    }
}

/// Pill attributes inferred from OCR text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAttributes {
    pub pill_name: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage: Option<String>,
    pub confidence: f32,
    pub raw_text: String,
    pub detected_texts: Vec<String>,
}

impl ExtractedAttributes {
    /// Zero-confidence result used when nothing was detected or OCR failed.
    pub fn empty() -> Self {
        Self {
            pill_name: None,
            manufacturer: None,
            dosage: None,
            confidence: 0.0,
            raw_text: String::new(),
            detected_texts: Vec::new(),
        }
    }
}

/// Extracted attributes reconciled against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    #[serde(flatten)]
    pub attributes: ExtractedAttributes,
    pub matched_pill: Option<CatalogEntry>,
}

impl RecognitionResult {
    pub fn unmatched(attributes: ExtractedAttributes) -> Self {
        Self {
            attributes,
            matched_pill: None,
        }
    }
}
