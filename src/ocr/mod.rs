//! OCR Module
//!
//! Whole-page text recognition with word bounding boxes.
//!
//! Supports two Tesseract bindings:
//! - The `tesseract` command line program (default)
//! - Linked libtesseract (`ocr-tesseract` feature)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use textcoords_server::ocr::OcrService;
//!
//! let engine = OcrService::engine_from_config(&config.ocr);
//! let service = OcrService::new(engine, &config.ocr);
//!
//! let result = service.recognize(&bitmap).await?;
//! for word in &result.words {
//!     println!("{} at {:?}", word.text, word.bbox);
//! }
//! ```

mod provider;
mod service;
pub mod tsv;
mod types;

pub use provider::{OcrEngine, TesseractCli};
pub use service::OcrService;
pub use types::{
    EngineBox, EngineMode, OcrError, PageSegMode, RecognitionParams, RecognitionResult,
    RecognizedWord,
};

#[cfg(feature = "ocr-tesseract")]
pub use provider::TesseractLib;

#[cfg(test)]
pub(crate) use provider::MockEngine;
