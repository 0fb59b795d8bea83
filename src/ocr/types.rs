//! OCR Types
//!
//! Engine-native recognition output and the fixed parameters every
//! recognition call runs with.

/// Tesseract page segmentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegMode {
    /// Fully automatic page segmentation, no OSD (`--psm 3`)
    Auto,
}

impl PageSegMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::Auto => "3",
        }
    }
}

/// Tesseract OCR engine mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Whatever the installed engine considers default (`--oem 3`)
    Default,
}

impl EngineMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::Default => "3",
        }
    }
}

/// Parameters for one recognition call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionParams {
    pub language: String,
    pub page_seg_mode: PageSegMode,
    pub engine_mode: EngineMode,
}

impl RecognitionParams {
    /// End-to-end recognition over the whole page
    pub fn full_page(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            page_seg_mode: PageSegMode::Auto,
            engine_mode: EngineMode::Default,
        }
    }
}

/// Engine-native bounding box in pixels
///
/// Edges are passed through exactly as the engine reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

/// Single recognized word
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedWord {
    pub text: String,
    /// Word confidence (0-100)
    pub confidence: f32,
    pub bbox: EngineBox,
}

/// Full recognition output, words in engine reading order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
    pub text: String,
    pub words: Vec<RecognizedWord>,
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("OCR engine output could not be parsed: {0}")]
    InvalidOutput(String),

    #[error("OCR timed out after {0}s")]
    Timeout(u64),

    #[error("No OCR slot freed up within {0}s")]
    Busy(u64),
}
