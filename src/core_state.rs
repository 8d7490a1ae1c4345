//! Application state shared by the UI layer.
//!
//! `CoreState` wires the recognition pipeline, the record service and the
//! optional speech announcer from an `AppConfig`. The catalog and record
//! table live in Supabase when it is configured, otherwise in the local
//! SQLite database.

use std::sync::Arc;

use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, ConfigError};
use crate::db::{CatalogStore, DatabaseError, PostgrestStore, RecordStore, SqliteStore, StoreError};
use crate::models::{MedicationRecordInput, RecognitionResult, RecordWithPill};
use crate::pipeline::recognition::{
    CaptureGate, CatalogMatcher, GoogleVisionClient, ImageHandle, Recognition, RecognitionError,
    RecognitionPipeline, TextDetector,
};
use crate::records::{MedicationRecordService, SaveOutcome};
use crate::session::{AnonymousSession, SessionProvider, SupabaseSession};
use crate::speech::{self, Announcer, SpeechOutput};
use crate::time_period::current_time_period;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Store client error: {0}")]
    Store(#[from] StoreError),

    #[error("Vision client error: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Session client error: {0}")]
    Session(#[from] reqwest::Error),
}

pub struct CoreState {
    pub pipeline: RecognitionPipeline,
    pub records: MedicationRecordService,
    capture_gate: CaptureGate,
    clock: Arc<dyn Clock>,
    announcer: Option<Announcer>,
}

impl CoreState {
    /// Build the production graph from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let detector: Arc<dyn TextDetector> = Arc::new(GoogleVisionClient::new(
            &config.google_vision_endpoint,
            config.vision_api_key()?,
            config.http_timeout_secs,
        )?);

        let (catalog, store, session): (
            Arc<dyn CatalogStore>,
            Arc<dyn RecordStore>,
            Arc<dyn SessionProvider>,
        ) = match config.supabase() {
            Some((url, anon_key)) => {
                tracing::info!(url, "Using Supabase backend");
                let mut client = PostgrestStore::new(url, anon_key, config.http_timeout_secs)?;
                if let Some(token) = config.supabase_access_token.as_deref() {
                    client = client.with_access_token(token);
                }
                let client = Arc::new(client);
                let session: Arc<dyn SessionProvider> = Arc::new(SupabaseSession::new(
                    url,
                    anon_key,
                    config.supabase_access_token.clone(),
                    config.http_timeout_secs,
                )?);
                let catalog: Arc<dyn CatalogStore> = client.clone();
                let store: Arc<dyn RecordStore> = client;
                (catalog, store, session)
            }
            None => {
                tracing::info!(path = %config.database_path.display(), "Using local SQLite backend");
                let local = Arc::new(SqliteStore::open(&config.database_path)?);
                let catalog: Arc<dyn CatalogStore> = local.clone();
                let store: Arc<dyn RecordStore> = local;
                let session: Arc<dyn SessionProvider> = Arc::new(AnonymousSession);
                (catalog, store, session)
            }
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let records = MedicationRecordService::new(store, session, clock.clone())
            .with_recent_limit(config.recent_limit);
        let pipeline = RecognitionPipeline::new(detector, CatalogMatcher::new(catalog));

        Ok(Self::from_parts(pipeline, records, clock))
    }

    pub fn from_parts(
        pipeline: RecognitionPipeline,
        records: MedicationRecordService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pipeline,
            records,
            capture_gate: CaptureGate::new(),
            clock,
            announcer: None,
        }
    }

    /// Attach a speech engine; results and records are then read aloud.
    pub fn with_speech(mut self, output: Arc<dyn SpeechOutput>) -> Self {
        self.announcer = Some(Announcer::new(output));
        self
    }

    pub fn announcer(&self) -> Option<&Announcer> {
        self.announcer.as_ref()
    }

    /// Recognize a freshly captured photo. Returns `None` when a newer
    /// capture started before this one finished.
    pub async fn recognize_capture(
        &self,
        image: &ImageHandle,
    ) -> Result<Option<Recognition>, RecognitionError> {
        let ticket = self.capture_gate.begin();
        let recognition = self
            .pipeline
            .recognize_latest(&self.capture_gate, ticket, image)
            .await?;

        if let (Some(announcer), Some(recognition)) = (&self.announcer, &recognition) {
            announcer.announce(&speech::recognition_speech(&recognition.result));
        }
        Ok(recognition)
    }

    /// Save a recognition result as taken now.
    pub async fn save_recognition(
        &self,
        result: &RecognitionResult,
        notes: Option<String>,
    ) -> SaveOutcome {
        let mut input: MedicationRecordInput = self.records.input_from_recognition(result);
        input.notes = notes;
        self.records.save(input).await
    }

    /// Read a saved record back to the user.
    pub fn announce_record(&self, record: &RecordWithPill) {
        if let Some(announcer) = &self.announcer {
            announcer.announce(&speech::record_speech(&record.record));
        }
    }

    /// Greeting for the current time of day, spoken when speech is attached.
    pub fn greet(&self) -> &'static str {
        let greeting = current_time_period(self.clock.as_ref()).greeting();
        if let Some(announcer) = &self.announcer {
            announcer.announce(greeting);
        }
        greeting
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{Local, TimeZone};

    use super::*;
    use crate::clock::FixedClock;
    use crate::pipeline::recognition::MockTextDetector;
    use crate::speech::{SpeechError, SpeechOptions};

    #[derive(Default)]
    struct CapturedSpeech(Mutex<Vec<String>>);

    impl SpeechOutput for CapturedSpeech {
        fn speak(&self, text: &str, _options: &SpeechOptions) -> Result<(), SpeechError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn stop(&self) -> Result<(), SpeechError> {
            Ok(())
        }
    }

    fn state(text: &str, hour: u32) -> CoreState {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Local.with_ymd_and_hms(2026, 10, 16, hour, 0, 0).unwrap()));
        let pipeline = RecognitionPipeline::new(
            Arc::new(MockTextDetector::from_text(text)),
            CatalogMatcher::new(store.clone()),
        );
        let records = MedicationRecordService::new(store, Arc::new(AnonymousSession), clock.clone());
        CoreState::from_parts(pipeline, records, clock)
    }

    fn config(dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            google_vision_api_key: Some("vision-key".into()),
            database_path: dir.path().join("nested").join("pillscan.db"),
            ..AppConfig::default()
        }
    }

    // ── from_config ──

    #[test]
    fn local_backend_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        CoreState::from_config(&config).unwrap();
        assert!(config.database_path.exists());
    }

    #[test]
    fn missing_vision_key_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            google_vision_api_key: None,
            ..config(&dir)
        };
        let err = CoreState::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            StartupError::Config(ConfigError::Missing("GOOGLE_VISION_API_KEY"))
        ));
    }

    #[test]
    fn supabase_backend_skips_local_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            supabase_url: Some("https://abc.supabase.co".into()),
            supabase_anon_key: Some("anon".into()),
            ..config(&dir)
        };
        CoreState::from_config(&config).unwrap();
        assert!(!config.database_path.exists());
    }

    // ── flows ──

    #[tokio::test]
    async fn capture_then_save_flow() {
        let state = state("ガスター10 第一三共", 8);
        let recognition = state
            .recognize_capture(&ImageHandle::Bytes(vec![1, 2, 3]))
            .await
            .unwrap()
            .unwrap();

        let outcome = state.save_recognition(&recognition.result, Some("朝食後".into())).await;
        assert!(outcome.success);

        let today = state.records.today_records().await;
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].record.pill_name, "ガスター10");
        assert_eq!(today[0].record.manufacturer.as_deref(), Some("第一三共"));
        assert_eq!(today[0].record.notes.as_deref(), Some("朝食後"));
        assert_eq!(today[0].record.time_period.as_str(), "morning");
    }

    #[tokio::test]
    async fn speech_reads_results_and_records() {
        let output = Arc::new(CapturedSpeech::default());
        let state = state("正露丸 大幸薬品", 22).with_speech(output.clone());
        assert!(state.announcer().is_some());

        assert_eq!(state.greet(), "お疲れさまです。夜の服薬時間ですね。");

        let recognition = state
            .recognize_capture(&ImageHandle::Bytes(vec![1]))
            .await
            .unwrap()
            .unwrap();
        state.save_recognition(&recognition.result, None).await;
        let recent = state.records.recent_records(None).await;
        state.announce_record(&recent[0]);

        let spoken = output.0.lock().unwrap();
        assert_eq!(spoken.len(), 3);
        assert!(spoken[1].starts_with("薬剤名は、正露丸です。製造元は、大幸薬品です。"));
        assert_eq!(spoken[2], "正露丸、夜に服薬済み");
    }

    #[test]
    fn greeting_without_speech() {
        let state = state("", 13);
        assert!(state.announcer().is_none());
        assert_eq!(state.greet(), "こんにちは。昼の服薬時間ですね。");
    }
}
