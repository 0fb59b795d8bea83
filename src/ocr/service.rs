//! OCR Service
//!
//! Runs the configured engine with fixed parameters, a latency bound, and a
//! cap on concurrent recognitions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::provider::{OcrEngine, TesseractCli};
use super::types::{OcrError, RecognitionParams, RecognitionResult};
use crate::bitmap::CanonicalBitmap;
use crate::config::{EngineKind, OcrConfig};

/// OCR service for whole-page recognition
pub struct OcrService {
    engine: Arc<dyn OcrEngine>,
    params: RecognitionParams,
    timeout: Duration,
    permits: Semaphore,
}

impl OcrService {
    pub fn new(engine: Arc<dyn OcrEngine>, config: &OcrConfig) -> Self {
        Self {
            engine,
            params: RecognitionParams::full_page(config.language.clone()),
            timeout: config.timeout,
            permits: Semaphore::new(config.max_concurrency),
        }
    }

    /// Build the engine named by the configuration
    pub fn engine_from_config(config: &OcrConfig) -> Arc<dyn OcrEngine> {
        match config.engine {
            EngineKind::Cli => Arc::new(TesseractCli::new(
                config.tesseract_cmd.clone(),
                config.tessdata_dir.clone(),
            )),
            #[cfg(feature = "ocr-tesseract")]
            EngineKind::Native => Arc::new(super::provider::TesseractLib::new(
                config.tessdata_dir.clone(),
                config.language.clone(),
            )),
            #[cfg(not(feature = "ocr-tesseract"))]
            EngineKind::Native => {
                tracing::warn!(
                    "OCR_ENGINE=native requires the 'ocr-tesseract' feature, using the tesseract CLI"
                );
                Arc::new(TesseractCli::new(
                    config.tesseract_cmd.clone(),
                    config.tessdata_dir.clone(),
                ))
            }
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn is_available(&self) -> bool {
        self.engine.is_available().await
    }

    pub fn params(&self) -> &RecognitionParams {
        &self.params
    }

    /// Recognize a canonical bitmap
    ///
    /// Waiting for a permit and the engine call each get the full timeout.
    pub async fn recognize(&self, bitmap: &CanonicalBitmap) -> Result<RecognitionResult, OcrError> {
        let _permit = tokio::time::timeout(self.timeout, self.permits.acquire())
            .await
            .map_err(|_| OcrError::Busy(self.timeout.as_secs()))?
            .map_err(|_| OcrError::EngineNotAvailable("OCR service is shutting down".to_string()))?;

        let started = std::time::Instant::now();
        let result = tokio::time::timeout(self.timeout, self.engine.recognize(bitmap, &self.params))
            .await
            .map_err(|_| OcrError::Timeout(self.timeout.as_secs()))??;

        tracing::debug!(
            engine = self.engine.name(),
            language = %self.params.language,
            words = result.words.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Recognition complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Normalizer;
    use crate::config::Config;
    use crate::ocr::provider::MockEngine;
    use crate::upload::{ImageKind, UploadCandidate, UploadPolicy};

    fn bitmap() -> CanonicalBitmap {
        let upload = UploadPolicy::new(usize::MAX, ImageKind::ALL.to_vec())
            .validate(Some(UploadCandidate {
                bytes: crate::bitmap::tests::sample_image(image::ImageFormat::Png).into(),
                declared_mime: "image/png".to_string(),
                file_name: None,
            }))
            .unwrap();
        Normalizer::new(10_000).normalize(&upload).unwrap()
    }

    fn config() -> OcrConfig {
        Config::default().ocr
    }

    #[tokio::test]
    async fn test_fixed_parameters() {
        let service = OcrService::new(Arc::new(MockEngine::returning(RecognitionResult::default())), &config());
        assert_eq!(service.params(), &RecognitionParams::full_page("eng"));
        assert_eq!(service.engine_name(), "mock");
        assert!(service.is_available().await);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let service = OcrService::new(Arc::new(MockEngine::failing("crashed")), &config());
        let err = service.recognize(&bitmap()).await.unwrap_err();
        assert!(matches!(err, OcrError::Engine(ref msg) if msg == "crashed"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut engine = MockEngine::returning(RecognitionResult::default());
        engine.delay = Some(Duration::from_secs(5));

        let mut config = config();
        config.timeout = Duration::from_millis(50);

        let service = OcrService::new(Arc::new(engine), &config);
        let err = service.recognize(&bitmap()).await.unwrap_err();
        assert!(matches!(err, OcrError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_queue_wait_is_bounded() {
        let engine = Arc::new(MockEngine::returning(RecognitionResult::default()));

        let mut config = config();
        config.max_concurrency = 1;
        config.timeout = Duration::from_millis(50);

        let service = OcrService::new(engine.clone(), &config);
        let _held = service.permits.acquire().await.unwrap();

        let err = service.recognize(&bitmap()).await.unwrap_err();
        assert!(matches!(err, OcrError::Busy(_)));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let mut engine = MockEngine::returning(RecognitionResult::default());
        engine.delay = Some(Duration::from_millis(50));

        let mut config = config();
        config.max_concurrency = 1;

        let service = Arc::new(OcrService::new(Arc::new(engine), &config));
        let bitmap = bitmap();

        let started = std::time::Instant::now();
        let (a, b) = tokio::join!(service.recognize(&bitmap), service.recognize(&bitmap));
        assert!(a.is_ok() && b.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_engine_from_config() {
        let engine = OcrService::engine_from_config(&config());
        assert_eq!(engine.name(), "tesseract-cli");
    }
}
