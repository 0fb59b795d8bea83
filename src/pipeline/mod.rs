//! Extraction pipeline
//!
//! `Received -> Validated -> Normalized -> Recognized -> Projected -> Responded`
//!
//! Any stage may fail, which ends the request with that error. There are no
//! retries and nothing is observable by the caller before the one response.

mod projector;
mod response;

pub use projector::project;
pub use response::{Border, Projection, ResponseEnvelope, Word};

use std::sync::Arc;

use crate::bitmap::Normalizer;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::ocr::{OcrEngine, OcrService};
use crate::upload::{UploadPolicy, UploadedImage};

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Normalized,
    Recognized,
    Projected,
    Responded,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Normalized => "normalized",
            Self::Recognized => "recognized",
            Self::Projected => "projected",
            Self::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Per-server pipeline; holds configuration only, no per-request state
pub struct Pipeline {
    policy: UploadPolicy,
    normalizer: Normalizer,
    ocr: OcrService,
}

impl Pipeline {
    pub fn new(config: &Config, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            policy: UploadPolicy::from_config(&config.upload),
            normalizer: Normalizer::new(config.upload.max_dimension),
            ocr: OcrService::new(engine, &config.ocr),
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }

    /// Run a validated upload through normalization, recognition and projection
    pub async fn run(&self, upload: UploadedImage) -> Result<Projection> {
        tracing::debug!(stage = %Stage::Validated, kind = %upload.kind(), size = upload.size(), "Upload validated");

        let normalizer = self.normalizer.clone();
        let bitmap = tokio::task::spawn_blocking(move || normalizer.normalize(&upload))
            .await
            .map_err(|e| PipelineError::Internal(format!("Normalization task failed: {}", e)))??;
        tracing::debug!(
            stage = %Stage::Normalized,
            width = bitmap.width(),
            height = bitmap.height(),
            "Image normalized"
        );

        let recognition = self.ocr.recognize(&bitmap).await?;
        drop(bitmap);
        tracing::debug!(stage = %Stage::Recognized, words = recognition.words.len(), "Text recognized");

        let projection = project(recognition)?;
        tracing::debug!(stage = %Stage::Projected, words = projection.words.len(), "Result projected");

        Ok(projection)
    }
}
