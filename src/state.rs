//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{OcrEngine, OcrService};
use crate::pipeline::Pipeline;

/// Shared application state
///
/// Read-only after construction; requests never share mutable data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pipeline: Pipeline,
}

impl AppState {
    /// Create application state around an explicit OCR engine
    pub fn new(config: Config, engine: Arc<dyn OcrEngine>) -> Self {
        let pipeline = Pipeline::new(&config, engine);
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    /// Create application state with the engine named in the configuration
    pub fn from_config(config: Config) -> Self {
        let engine = OcrService::engine_from_config(&config.ocr);
        Self::new(config, engine)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the extraction pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }
}
