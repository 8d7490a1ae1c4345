//! Text detection via an external vision service.
//!
//! `GoogleVisionClient` sends the photo to the Cloud Vision `images:annotate`
//! endpoint with both `TEXT_DETECTION` and `DOCUMENT_TEXT_DETECTION` so the
//! extractor gets the per-word annotations and the denser full-document text.
//! One request per call; no retry and no caching.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::RecognitionError;
use crate::models::RawDetection;

// ──────────────────────────────────────────────
// Constants
// ──────────────────────────────────────────────

pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

const TEXT_DETECTION_MAX_RESULTS: u32 = 100;
const DOCUMENT_TEXT_DETECTION_MAX_RESULTS: u32 = 50;

// ──────────────────────────────────────────────
// Image handle
// ──────────────────────────────────────────────

/// Captured photo, as handed over by the camera layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageHandle {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageHandle {
    /// Read the image bytes. An empty image is rejected before any network call.
    pub async fn load(&self) -> Result<Vec<u8>, RecognitionError> {
        let bytes = match self {
            Self::File(path) => tokio::fs::read(path).await?,
            Self::Bytes(bytes) => bytes.clone(),
        };
        if bytes.is_empty() {
            return Err(RecognitionError::Validation("画像データが空です".into()));
        }
        Ok(bytes)
    }
}

/// Anything that turns a photo into raw OCR text.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect(&self, image: &ImageHandle) -> Result<RawDetection, RecognitionError>;
}

// ──────────────────────────────────────────────
// Wire types
// ──────────────────────────────────────────────

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    feature_type: &'static str,
    max_results: u32,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct VisionStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

fn annotate_request(image_bytes: &[u8]) -> AnnotateRequest {
    AnnotateRequest {
        requests: vec![AnnotateImageRequest {
            image: ImageContent {
                content: base64::engine::general_purpose::STANDARD.encode(image_bytes),
            },
            features: vec![
                Feature {
                    feature_type: "TEXT_DETECTION",
                    max_results: TEXT_DETECTION_MAX_RESULTS,
                },
                Feature {
                    feature_type: "DOCUMENT_TEXT_DETECTION",
                    max_results: DOCUMENT_TEXT_DETECTION_MAX_RESULTS,
                },
            ],
        }],
    }
}

fn detection_from_response(response: AnnotateResponse) -> Result<RawDetection, RecognitionError> {
    let first = response.responses.into_iter().next().unwrap_or_default();

    if let Some(status) = first.error {
        return Err(RecognitionError::Rejected {
            code: status.code,
            message: status.message,
        });
    }

    Ok(RawDetection {
        full_text: first.full_text_annotation.map(|f| f.text).unwrap_or_default(),
        fragments: first
            .text_annotations
            .into_iter()
            .map(|a| a.description)
            .collect(),
    })
}

// ──────────────────────────────────────────────
// GoogleVisionClient
// ──────────────────────────────────────────────

/// Cloud Vision API client.
pub struct GoogleVisionClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleVisionClient {
    pub fn new(endpoint: &str, api_key: &str, timeout_secs: u64) -> Result<Self, RecognitionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RecognitionError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }
}

#[async_trait]
impl TextDetector for GoogleVisionClient {
    async fn detect(&self, image: &ImageHandle) -> Result<RawDetection, RecognitionError> {
        let image_bytes = image.load().await?;
        let start = std::time::Instant::now();
        tracing::debug!(image_size = image_bytes.len(), "Sending image to Vision API");

        let url = format!("{}/v1/images:annotate", self.endpoint);
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&annotate_request(&image_bytes))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecognitionError::Http(format!("Request timed out: {e}"))
                } else {
                    RecognitionError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Vision API returned an error status");
            return Err(RecognitionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::ResponseParsing(e.to_string()))?;
        let detection = detection_from_response(parsed)?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            fragments = detection.fragments.len(),
            text_len = detection.full_text.chars().count(),
            "Vision API text detection complete"
        );

        Ok(detection)
    }
}

// ──────────────────────────────────────────────
// MockTextDetector (testing)
// ──────────────────────────────────────────────

/// Text detector returning a fixed detection or a fixed service error.
pub struct MockTextDetector {
    detection: RawDetection,
    failure: Option<(u16, String)>,
    calls: AtomicUsize,
}

impl MockTextDetector {
    pub fn new(detection: RawDetection) -> Self {
        Self {
            detection,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Detector built from a single text block, as Vision returns it: the
    /// full text doubles as the first annotation, followed by its words.
    pub fn from_text(text: &str) -> Self {
        let mut fragments = vec![text.to_string()];
        fragments.extend(text.split_whitespace().map(String::from));
        Self::new(RawDetection::new(text, fragments))
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            detection: RawDetection::default(),
            failure: Some((status, body.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextDetector for MockTextDetector {
    async fn detect(&self, image: &ImageHandle) -> Result<RawDetection, RecognitionError> {
        image.load().await?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some((status, body)) => Err(RecognitionError::Service {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(self.detection.clone()),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
