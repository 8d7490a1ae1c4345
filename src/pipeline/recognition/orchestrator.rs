//! Recognition pipeline orchestrator.
//!
//! Image → OCR → extract → catalog match, as one async call. OCR failures
//! degrade to a zero-confidence result carrying the error, so the caller can
//! tell the user and still move on to manual entry. Input problems are
//! returned as `Err` before any network call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::extractor;
use super::matcher::CatalogMatcher;
use super::ocr::{ImageHandle, TextDetector};
use super::RecognitionError;
use crate::models::{ExtractedAttributes, RecognitionResult};

/// Outcome of one recognition run.
#[derive(Debug)]
pub struct Recognition {
    pub result: RecognitionResult,
    /// The OCR failure behind a degraded result, if any.
    pub ocr_error: Option<RecognitionError>,
}

impl Recognition {
    pub fn is_degraded(&self) -> bool {
        self.ocr_error.is_some()
    }
}

pub struct RecognitionPipeline {
    detector: Arc<dyn TextDetector>,
    matcher: CatalogMatcher,
}

impl RecognitionPipeline {
    pub fn new(detector: Arc<dyn TextDetector>, matcher: CatalogMatcher) -> Self {
        Self { detector, matcher }
    }

    pub async fn recognize(&self, image: &ImageHandle) -> Result<Recognition, RecognitionError> {
        let detection = match self.detector.detect(image).await {
            Ok(detection) => detection,
            Err(e @ (RecognitionError::Validation(_) | RecognitionError::ImageRead(_))) => {
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Text detection failed; returning empty recognition");
                return Ok(Recognition {
                    result: RecognitionResult::unmatched(ExtractedAttributes::empty()),
                    ocr_error: Some(e),
                });
            }
        };

        let attributes = extractor::extract(&detection);
        let matched_pill = self.matcher.match_pill(&attributes).await;

        tracing::info!(
            pill_name = ?attributes.pill_name,
            confidence = attributes.confidence,
            matched = matched_pill.is_some(),
            "Recognition complete"
        );

        Ok(Recognition {
            result: RecognitionResult {
                attributes,
                matched_pill,
            },
            ocr_error: None,
        })
    }

    /// Run recognition for `ticket`, discarding the result if a newer capture
    /// started in the meantime.
    pub async fn recognize_latest(
        &self,
        gate: &CaptureGate,
        ticket: CaptureTicket,
        image: &ImageHandle,
    ) -> Result<Option<Recognition>, RecognitionError> {
        let recognition = self.recognize(image).await?;
        if gate.is_current(ticket) {
            Ok(Some(recognition))
        } else {
            tracing::debug!(ticket = ticket.0, "Discarding stale recognition result");
            Ok(None)
        }
    }
}

// ──────────────────────────────────────────────
// Capture gate
// ──────────────────────────────────────────────

/// Identifies one capture. Only the most recently issued ticket is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CaptureTicket(u64);

/// Issues monotonically increasing capture tickets.
#[derive(Debug, Default)]
pub struct CaptureGate {
    latest: AtomicU64,
}

impl CaptureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new capture, superseding every earlier ticket.
    pub fn begin(&self) -> CaptureTicket {
        CaptureTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: CaptureTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
