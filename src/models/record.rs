use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{RecordStatus, TimePeriod};
use super::pill::PillSummary;
use super::recognition::RecognitionResult;

/// Name stored when neither the OCR text nor the catalog yielded one.
pub const UNKNOWN_PILL_NAME: &str = "不明な薬剤";

/// Data needed to save one medication-taken event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecordInput {
    pub pill_id: Option<Uuid>,
    pub pill_name: String,
    pub manufacturer: Option<String>,
    pub dosage: Option<String>,
    pub image_url: Option<String>,
    pub recognized_text: Option<String>,
    pub confidence_score: Option<f32>,
    pub time_period: TimePeriod,
    pub notes: Option<String>,
}

impl MedicationRecordInput {
    /// Minimal input for a manually entered pill.
    pub fn new(pill_name: impl Into<String>, time_period: TimePeriod) -> Self {
        Self {
            pill_id: None,
            pill_name: pill_name.into(),
            manufacturer: None,
            dosage: None,
            image_url: None,
            recognized_text: None,
            confidence_score: None,
            time_period,
            notes: None,
        }
    }

    /// Build an input from a recognition result.
    ///
    /// The extracted text wins over the catalog for the denormalized fields so
    /// the record reflects what was on the package; the catalog fills gaps.
    pub fn from_recognition(result: &RecognitionResult, time_period: TimePeriod) -> Self {
        let attrs = &result.attributes;
        let matched = result.matched_pill.as_ref();

        let pill_name = attrs
            .pill_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| matched.map(|p| p.name.clone()))
            .unwrap_or_else(|| UNKNOWN_PILL_NAME.to_string());

        Self {
            pill_id: matched.map(|p| p.id),
            pill_name,
            manufacturer: attrs
                .manufacturer
                .clone()
                .or_else(|| matched.and_then(|p| p.manufacturer.clone())),
            dosage: attrs
                .dosage
                .clone()
                .or_else(|| matched.and_then(|p| p.dosage.clone())),
            image_url: None,
            recognized_text: (!attrs.raw_text.is_empty()).then(|| attrs.raw_text.clone()),
            confidence_score: Some(attrs.confidence),
            time_period,
            notes: None,
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A persisted medication-taken event (`medication_records` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub id: Uuid,
    /// `None` for records saved without a signed-in user.
    pub user_id: Option<String>,
    pub pill_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub recognized_text: Option<String>,
    pub confidence_score: Option<f32>,
    pub taken_at: DateTime<Utc>,
    pub time_period: TimePeriod,
    pub status: RecordStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pill_name: String,
    pub manufacturer: Option<String>,
    pub dosage: Option<String>,
}

/// A record together with its catalog entry, when `pill_id` resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordWithPill {
    #[serde(flatten)]
    pub record: MedicationRecord,
    #[serde(rename = "pills", default)]
    pub pill: Option<PillSummary>,
}
