//! Medication record service: builds, validates and saves records, and reads
//! them back for the today and history views.
//!
//! Writes report failures to the caller; reads degrade to an empty list.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::RecordStore;
use crate::models::{
    MedicationRecord, MedicationRecordInput, RecognitionResult, RecordStatus, RecordWithPill,
};
use crate::session::SessionProvider;
use crate::time_period::current_time_period;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Result of a save request, shaped for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn saved(id: Uuid) -> Self {
        Self {
            success: true,
            id: Some(id),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.into()),
        }
    }
}

pub struct MedicationRecordService {
    store: Arc<dyn RecordStore>,
    session: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    recent_limit: usize,
}

impl MedicationRecordService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        session: Arc<dyn SessionProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            session,
            clock,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    /// Record input for a recognition result, tagged with the current period.
    pub fn input_from_recognition(&self, result: &RecognitionResult) -> MedicationRecordInput {
        MedicationRecordInput::from_recognition(result, current_time_period(self.clock.as_ref()))
    }

    /// Save one medication-taken event. Never panics; every failure is
    /// reported through the outcome.
    pub async fn save(&self, input: MedicationRecordInput) -> SaveOutcome {
        if let Err(message) = validate(&input) {
            tracing::warn!(error = %message, "Rejected medication record input");
            return SaveOutcome::failed(message);
        }

        let user_id = self.session.current_user().await;
        if user_id.is_none() {
            tracing::info!("Saving record anonymously");
        }

        let now = self.clock.now().with_timezone(&Utc);
        let record = MedicationRecord {
            id: Uuid::new_v4(),
            user_id,
            pill_id: input.pill_id,
            image_url: input.image_url,
            recognized_text: input.recognized_text,
            confidence_score: input.confidence_score,
            taken_at: now,
            time_period: input.time_period,
            status: RecordStatus::Confirmed,
            notes: input.notes,
            created_at: now,
            pill_name: input.pill_name,
            manufacturer: input.manufacturer,
            dosage: input.dosage,
        };

        match self.store.insert_record(&record).await {
            Ok(id) => {
                tracing::info!(
                    record_id = %id,
                    pill_name = %record.pill_name,
                    time_period = %record.time_period,
                    "Medication record saved"
                );
                SaveOutcome::saved(id)
            }
            Err(e) => {
                tracing::error!(error = %e, pill_name = %record.pill_name, "Failed to save medication record");
                SaveOutcome::failed(e.to_string())
            }
        }
    }

    /// Records taken since local midnight today, newest first.
    pub async fn today_records(&self) -> Vec<RecordWithPill> {
        let (start, end) = local_day_bounds(self.clock.now().date_naive());
        match self.store.records_between(start, end).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load today's records");
                Vec::new()
            }
        }
    }

    /// Most recent records, newest first. `None` uses the configured limit.
    pub async fn recent_records(&self, limit: Option<usize>) -> Vec<RecordWithPill> {
        let limit = limit.unwrap_or(self.recent_limit);
        match self.store.recent_records(limit).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, limit, "Failed to load recent records");
                Vec::new()
            }
        }
    }
}

fn validate(input: &MedicationRecordInput) -> Result<(), String> {
    if input.pill_name.trim().is_empty() {
        return Err("薬剤名が入力されていません".to_string());
    }
    if let Some(score) = input.confidence_score {
        if !(0.0..=1.0).contains(&score) {
            return Err(format!("認識精度の値が不正です: {score}"));
        }
    }
    Ok(())
}

/// `[local midnight of date, local midnight of the next day)` in UTC.
fn local_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(date);
    let end = date
        .succ_opt()
        .map(local_midnight)
        .unwrap_or_else(|| start + Duration::days(1));
    (start, end)
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    // Midnight can fall in a DST gap; the earliest valid instant is close enough.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// History-list timestamp: `今日 HH:mm`, `昨日 HH:mm`, otherwise `M月d日 HH:mm`.
pub fn format_taken_at(taken_at: DateTime<Utc>, now: DateTime<Local>) -> String {
    let local = taken_at.with_timezone(&Local);
    let date = local.date_naive();
    let today = now.date_naive();

    if date == today {
        format!("今日 {}", local.format("%H:%M"))
    } else if today.pred_opt() == Some(date) {
        format!("昨日 {}", local.format("%H:%M"))
    } else {
        local.format("%-m月%-d日 %H:%M").to_string()
    }
}
