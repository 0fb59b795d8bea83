//! Error types for the Text Coordinates server
//!
//! Every pipeline stage returns a [`PipelineError`] on failure. The
//! `IntoResponse` impl below is the only place that turns one into a status
//! code and a user-visible message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::bitmap::NormalizeError;
use crate::ocr::OcrError;
use crate::pipeline::{ResponseEnvelope, Stage};

/// Pipeline-wide result type
pub type Result<T> = std::result::Result<T, PipelineError>;

pub const MISSING_FILE_MESSAGE: &str = "No image uploaded. Please upload a valid image.";
pub const NO_TEXT_MESSAGE: &str = "No readable text found in the image.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error. Please try again later.";

/// Pipeline error type
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No image uploaded")]
    MissingFile,

    #[error("Unsupported file type: {mime:?}")]
    UnsupportedType { mime: String, allowed: Vec<&'static str> },

    #[error("File too large: more than {max} bytes")]
    TooLarge { max: usize },

    #[error("Failed to decode image: {0}")]
    Decode(#[from] NormalizeError),

    #[error("Recognition failed: {0}")]
    Engine(#[from] OcrError),

    #[error("No text found in image")]
    NoTextFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::UnsupportedType { .. } | Self::TooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NoTextFound => StatusCode::BAD_REQUEST,
            Self::Decode(_) | Self::Engine(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// State the pipeline was in when it moved to failed
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::MissingFile | Self::UnsupportedType { .. } | Self::TooLarge { .. } => {
                Some(Stage::Received)
            }
            Self::Decode(_) => Some(Stage::Validated),
            Self::Engine(_) => Some(Stage::Normalized),
            Self::NoTextFound => Some(Stage::Recognized),
            Self::Internal(_) => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFile => "MISSING_FILE",
            Self::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
            Self::TooLarge { .. } => "TOO_LARGE",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Engine(_) => "ENGINE_FAILURE",
            Self::NoTextFound => "NO_TEXT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the caller. Processing failures never expose details.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingFile => MISSING_FILE_MESSAGE.to_string(),
            Self::UnsupportedType { allowed, .. } => format!(
                "Invalid file type. Only {} are allowed.",
                join_labels(allowed)
            ),
            Self::TooLarge { max } => format!(
                "File too large. Maximum allowed size is {}.",
                format_size(*max)
            ),
            Self::NoTextFound => NO_TEXT_MESSAGE.to_string(),
            Self::Decode(_) | Self::Engine(_) | Self::Internal(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), stage = ?self.stage(), "Error processing image: {}", self);
        } else {
            tracing::warn!(code = self.code(), stage = ?self.stage(), "Rejected image: {}", self);
        }

        let body = Json(ResponseEnvelope::failure(self.public_message()));
        (status, body).into_response()
    }
}

/// "JPEG, PNG, and WEBP"
fn join_labels(labels: &[&str]) -> String {
    match labels {
        [] => String::new(),
        [one] => one.to_string(),
        [a, b] => format!("{} and {}", a, b),
        [head @ .., last] => format!("{}, and {}", head.join(", "), last),
    }
}

fn format_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    const KIB: usize = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PipelineError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PipelineError::TooLarge { max: 10 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PipelineError::NoTextFound.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PipelineError::Engine(OcrError::Timeout(30)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PipelineError::Engine(OcrError::Busy(30)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PipelineError::Decode(NormalizeError::UnrecognizedFormat).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_messages() {
        let err = PipelineError::UnsupportedType {
            mime: "image/gif".to_string(),
            allowed: vec!["JPEG", "PNG", "WEBP"],
        };
        assert_eq!(
            err.public_message(),
            "Invalid file type. Only JPEG, PNG, and WEBP are allowed."
        );

        let err = PipelineError::TooLarge { max: 5 * 1024 * 1024 };
        assert_eq!(err.public_message(), "File too large. Maximum allowed size is 5 MB.");

        assert_eq!(PipelineError::MissingFile.public_message(), MISSING_FILE_MESSAGE);
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = PipelineError::Engine(OcrError::Engine(
            "Error opening data file /usr/share/tessdata/eng.traineddata".to_string(),
        ));
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
        assert!(err.to_string().contains("traineddata"));
    }

    #[test]
    fn test_join_labels() {
        assert_eq!(join_labels(&["PNG"]), "PNG");
        assert_eq!(join_labels(&["PNG", "WEBP"]), "PNG and WEBP");
    }
}
