//! Spoken feedback: text builders for recognition results and saved records,
//! and an `Announcer` that drives the platform speech engine.
//!
//! Playback itself belongs to the device layer behind `SpeechOutput`; the
//! engine reports progress back through `Announcer::on_event`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MedicationRecord, RecognitionResult};

/// Below this confidence the user is advised to take the photo again.
pub const RETAKE_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    pub language: String,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            language: "ja-JP".to_string(),
            pitch: 1.0,
            rate: 0.8,
            volume: 1.0,
        }
    }
}

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech engine error: {0}")]
    Engine(String),
}

/// Progress callbacks from the speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    Done,
    Stopped,
    Error(String),
}

/// Platform speech engine. Calls return once the request is queued.
pub trait SpeechOutput: Send + Sync {
    /// Whether the device has any voice to speak with.
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), SpeechError>;

    fn stop(&self) -> Result<(), SpeechError>;
}

// ──────────────────────────────────────────────
// Announcer
// ──────────────────────────────────────────────

pub struct Announcer {
    output: Arc<dyn SpeechOutput>,
    options: SpeechOptions,
    supported: bool,
    speaking: AtomicBool,
}

impl Announcer {
    pub fn new(output: Arc<dyn SpeechOutput>) -> Self {
        Self::with_options(output, SpeechOptions::default())
    }

    pub fn with_options(output: Arc<dyn SpeechOutput>, options: SpeechOptions) -> Self {
        let supported = output.is_available();
        tracing::info!(supported, "Speech output initialised");
        Self {
            output,
            options,
            supported,
            speaking: AtomicBool::new(false),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Speak `text`, cutting off whatever is currently being said.
    /// A no-op when the device cannot speak.
    pub fn announce(&self, text: &str) {
        if !self.supported {
            tracing::warn!("Speech output unavailable; skipping announcement");
            return;
        }
        if self.is_speaking() {
            self.stop();
        }

        self.speaking.store(true, Ordering::SeqCst);
        tracing::debug!(chars = text.chars().count(), "Speaking");
        if let Err(e) = self.output.speak(text, &self.options) {
            tracing::error!(error = %e, "Speech failed");
            self.speaking.store(false, Ordering::SeqCst);
        }
    }

    pub fn stop(&self) {
        match self.output.stop() {
            Ok(()) => self.speaking.store(false, Ordering::SeqCst),
            Err(e) => tracing::error!(error = %e, "Failed to stop speech"),
        }
    }

    pub fn on_event(&self, event: SpeechEvent) {
        match event {
            SpeechEvent::Started => tracing::debug!("Speech started"),
            SpeechEvent::Done | SpeechEvent::Stopped => {
                self.speaking.store(false, Ordering::SeqCst);
            }
            SpeechEvent::Error(message) => {
                tracing::error!(error = %message, "Speech engine reported an error");
                self.speaking.store(false, Ordering::SeqCst);
            }
        }
    }
}

// ──────────────────────────────────────────────
// Text builders
// ──────────────────────────────────────────────

/// Spoken summary of a recognition result.
pub fn recognition_speech(result: &RecognitionResult) -> String {
    let attrs = &result.attributes;
    let mut text = match attrs.pill_name.as_deref() {
        Some(name) => format!("薬剤名は、{name}です。"),
        None => "薬剤名を認識できませんでした。".to_string(),
    };
    if let Some(manufacturer) = attrs.manufacturer.as_deref() {
        text.push_str(&format!("製造元は、{manufacturer}です。"));
    }
    if let Some(dosage) = attrs.dosage.as_deref() {
        text.push_str(&format!("用量は、{dosage}です。"));
    }

    let percent = (attrs.confidence * 100.0).round() as u32;
    text.push_str(&format!("認識精度は、{percent}パーセントです。"));
    if attrs.confidence < RETAKE_CONFIDENCE {
        text.push_str("認識精度が低いため、再撮影をお勧めします。");
    }
    text
}

/// Spoken confirmation for a saved record, e.g. `ガスター10、朝に服薬済み`.
pub fn record_speech(record: &MedicationRecord) -> String {
    format!("{}、{}に服薬済み", record.pill_name, record.time_period.label())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::{ExtractedAttributes, RecordStatus, TimePeriod};

    #[derive(Default)]
    struct RecordingOutput {
        unavailable: bool,
        fail_speak: bool,
        spoken: Mutex<Vec<String>>,
        stops: Mutex<usize>,
    }

    impl SpeechOutput for RecordingOutput {
        fn is_available(&self) -> bool {
            !self.unavailable
        }

        fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), SpeechError> {
            assert_eq!(options.language, "ja-JP");
            if self.fail_speak {
                return Err(SpeechError::Engine("no audio focus".into()));
            }
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn stop(&self) -> Result<(), SpeechError> {
            *self.stops.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn result(name: Option<&str>, manufacturer: Option<&str>, dosage: Option<&str>, confidence: f32) -> RecognitionResult {
        RecognitionResult::unmatched(ExtractedAttributes {
            pill_name: name.map(String::from),
            manufacturer: manufacturer.map(String::from),
            dosage: dosage.map(String::from),
            confidence,
            ..ExtractedAttributes::empty()
        })
    }

    // ── text builders ──

    #[test]
    fn default_options() {
        let options = SpeechOptions::default();
        assert_eq!(options.language, "ja-JP");
        assert_eq!(options.rate, 0.8);
        assert_eq!(options.pitch, 1.0);
        assert_eq!(options.volume, 1.0);
    }

    #[test]
    fn full_recognition_speech() {
        let text = recognition_speech(&result(
            Some("ロキソニン錠60mg"),
            Some("第一三共"),
            Some("60mg"),
            1.0,
        ));
        assert_eq!(
            text,
            "薬剤名は、ロキソニン錠60mgです。製造元は、第一三共です。用量は、60mgです。認識精度は、100パーセントです。"
        );
    }

    #[test]
    fn low_confidence_suggests_retake() {
        let text = recognition_speech(&result(None, None, None, 0.1));
        assert_eq!(
            text,
            "薬剤名を認識できませんでした。認識精度は、10パーセントです。認識精度が低いため、再撮影をお勧めします。"
        );
    }

    #[test]
    fn retake_threshold_is_exclusive() {
        let text = recognition_speech(&result(Some("イブ"), None, None, 0.5));
        assert!(text.contains("50パーセント"));
        assert!(!text.contains("再撮影"));
    }

    #[test]
    fn record_confirmation() {
        let now = Utc::now();
        let record = MedicationRecord {
            id: Uuid::new_v4(),
            user_id: None,
            pill_id: None,
            image_url: None,
            recognized_text: None,
            confidence_score: None,
            taken_at: now,
            time_period: TimePeriod::Evening,
            status: RecordStatus::Confirmed,
            notes: None,
            created_at: now,
            pill_name: "ガスター10".into(),
            manufacturer: None,
            dosage: None,
        };
        assert_eq!(record_speech(&record), "ガスター10、夕方に服薬済み");
    }

    // ── announcer ──

    #[test]
    fn announce_stops_current_utterance_first() {
        let output = Arc::new(RecordingOutput::default());
        let announcer = Announcer::new(output.clone());

        announcer.announce("一つ目");
        assert!(announcer.is_speaking());
        assert_eq!(*output.stops.lock().unwrap(), 0);

        announcer.announce("二つ目");
        assert_eq!(*output.stops.lock().unwrap(), 1);
        assert_eq!(*output.spoken.lock().unwrap(), vec!["一つ目", "二つ目"]);
    }

    #[test]
    fn engine_events_clear_speaking() {
        let announcer = Announcer::new(Arc::new(RecordingOutput::default()));
        for event in [
            SpeechEvent::Done,
            SpeechEvent::Stopped,
            SpeechEvent::Error("interrupted".into()),
        ] {
            announcer.announce("テスト");
            announcer.on_event(SpeechEvent::Started);
            assert!(announcer.is_speaking());
            announcer.on_event(event);
            assert!(!announcer.is_speaking());
        }
    }

    #[test]
    fn unsupported_device_is_silent() {
        let output = Arc::new(RecordingOutput {
            unavailable: true,
            ..Default::default()
        });
        let announcer = Announcer::new(output.clone());
        assert!(!announcer.is_supported());

        announcer.announce("テスト");
        assert!(!announcer.is_speaking());
        assert!(output.spoken.lock().unwrap().is_empty());
    }

    #[test]
    fn speak_failure_resets_state() {
        let announcer = Announcer::new(Arc::new(RecordingOutput {
            fail_speak: true,
            ..Default::default()
        }));
        announcer.announce("テスト");
        assert!(!announcer.is_speaking());
    }
}
