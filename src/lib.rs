//! Text Coordinates Server Library
//!
//! Accepts an uploaded image, normalizes it to PNG, runs OCR, and returns the
//! recognized text with a bounding box per word.
//!
//! # Modules
//!
//! - `upload`: multipart reading and input validation
//! - `bitmap`: decoding and PNG normalization
//! - `ocr`: recognition engines and the OCR service
//! - `pipeline`: stage orchestration, projection, response envelope
//! - `routes`: HTTP endpoints

pub mod bitmap;
pub mod config;
pub mod error;
pub mod ocr;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::Config;
pub use error::PipelineError;
pub use state::AppState;
