//! Attribute extraction: OCR text in, pill name / manufacturer / dosage and a
//! confidence score out. Pure and infallible.

use crate::models::{ExtractedAttributes, RawDetection, MAX_DETECTED_TEXTS};

use super::patterns::{self, DOSAGE_RULES, MANUFACTURER_RULES, PILL_NAME_RULES};

/// Full text longer than this many characters earns the length bonus.
pub const LONG_TEXT_CHARS: usize = 20;

/// Immutable view of what the pattern rules found, scored by `score`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDraft {
    pub has_text: bool,
    pub pill_name: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage: Option<String>,
    pub text_chars: usize,
}

/// One additive term of the confidence score.
pub struct ConfidenceRule {
    pub label: &'static str,
    pub weight: f32,
    applies: fn(&AttributeDraft) -> bool,
}

impl ConfidenceRule {
    pub fn applies(&self, draft: &AttributeDraft) -> bool {
        (self.applies)(draft)
    }
}

fn text_present(d: &AttributeDraft) -> bool {
    d.has_text
}

fn name_found(d: &AttributeDraft) -> bool {
    d.pill_name.is_some()
}

fn known_product(d: &AttributeDraft) -> bool {
    d.pill_name.as_deref().is_some_and(patterns::is_known_product)
}

fn manufacturer_found(d: &AttributeDraft) -> bool {
    d.manufacturer.is_some()
}

fn dosage_found(d: &AttributeDraft) -> bool {
    d.dosage.is_some()
}

fn long_text(d: &AttributeDraft) -> bool {
    d.text_chars > LONG_TEXT_CHARS
}

pub const CONFIDENCE_RULES: &[ConfidenceRule] = &[
    ConfidenceRule { label: "text_present", weight: 0.10, applies: text_present },
    ConfidenceRule { label: "pill_name", weight: 0.50, applies: name_found },
    ConfidenceRule { label: "known_product", weight: 0.20, applies: known_product },
    ConfidenceRule { label: "manufacturer", weight: 0.20, applies: manufacturer_found },
    ConfidenceRule { label: "dosage", weight: 0.10, applies: dosage_found },
    ConfidenceRule { label: "long_text", weight: 0.10, applies: long_text },
];

/// Sum of the weights of every rule that applies, clamped to [0, 1].
pub fn score(draft: &AttributeDraft) -> f32 {
    CONFIDENCE_RULES
        .iter()
        .filter(|rule| rule.applies(draft))
        .fold(0.0_f32, |acc, rule| acc + rule.weight)
        .clamp(0.0, 1.0)
}

/// Run the ordered pattern rules over the detection's full text.
pub fn draft(detection: &RawDetection) -> AttributeDraft {
    let text = detection.full_text.as_str();
    AttributeDraft {
        has_text: !detection.fragments.is_empty(),
        pill_name: patterns::first_match(&PILL_NAME_RULES, text),
        manufacturer: patterns::first_match(&MANUFACTURER_RULES, text),
        dosage: patterns::first_match(&DOSAGE_RULES, text),
        text_chars: text.chars().count(),
    }
}

/// Infer pill attributes from one OCR detection.
///
/// No fragments means nothing was read: the result is empty with confidence 0.
pub fn extract(detection: &RawDetection) -> ExtractedAttributes {
    if detection.fragments.is_empty() {
        tracing::debug!("No text detected; returning empty attributes");
        return ExtractedAttributes::empty();
    }

    let draft = draft(detection);
    let confidence = score(&draft);

    tracing::debug!(
        pill_name = ?draft.pill_name,
        manufacturer = ?draft.manufacturer,
        dosage = ?draft.dosage,
        confidence,
        "Extracted pill attributes"
    );

    ExtractedAttributes {
        pill_name: draft.pill_name,
        manufacturer: draft.manufacturer,
        dosage: draft.dosage,
        confidence,
        raw_text: detection.full_text.clone(),
        detected_texts: detection
            .fragments
            .iter()
            .take(MAX_DETECTED_TEXTS)
            .cloned()
            .collect(),
    }
}
