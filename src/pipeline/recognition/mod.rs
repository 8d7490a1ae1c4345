pub mod ocr;
pub mod patterns;
pub mod extractor;
pub mod matcher;
pub mod orchestrator;

pub use ocr::*;
pub use extractor::*;
pub use matcher::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Vision API error: {status} - {body}")]
    Service { status: u16, body: String },

    #[error("Vision API rejected the image (code {code}): {message}")]
    Rejected { code: i32, message: String },

    #[error("Vision API request failed: {0}")]
    Http(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Image could not be read: {0}")]
    ImageRead(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl RecognitionError {
    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::ImageRead(_) => "画像の変換に失敗しました".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Service { .. } | Self::Rejected { .. } | Self::Http(_) | Self::ResponseParsing(_) => {
                "AI解析に失敗しました".to_string()
            }
        }
    }
}
