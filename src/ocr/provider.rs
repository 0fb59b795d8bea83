//! OCR Engines
//!
//! Defines the engine trait and the Tesseract bindings behind it.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::tsv;
use super::types::{OcrError, RecognitionParams, RecognitionResult};
use crate::bitmap::CanonicalBitmap;

/// OCR engine trait
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs and health output
    fn name(&self) -> &'static str;

    /// Check if the engine can run
    async fn is_available(&self) -> bool;

    /// Recognize a whole page. Dropping the future abandons the call.
    async fn recognize(
        &self,
        bitmap: &CanonicalBitmap,
        params: &RecognitionParams,
    ) -> Result<RecognitionResult, OcrError>;
}

/// Tesseract via its command line program
///
/// The bitmap is piped on stdin and TSV is read back from stdout.
pub struct TesseractCli {
    program: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractCli {
    pub fn new(program: impl Into<PathBuf>, tessdata_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            tessdata_dir,
        }
    }

    fn command(&self, params: &RecognitionParams) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&params.language)
            .arg("--oem")
            .arg(params.engine_mode.as_arg())
            .arg("--psm")
            .arg(params.page_seg_mode.as_arg());

        if let Some(dir) = &self.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }

        command
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract-cli"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn recognize(
        &self,
        bitmap: &CanonicalBitmap,
        params: &RecognitionParams,
    ) -> Result<RecognitionResult, OcrError> {
        let mut child = self.command(params).spawn().map_err(|e| {
            OcrError::EngineNotAvailable(format!(
                "Failed to run {}: {}",
                self.program.display(),
                e
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Engine("tesseract stdin unavailable".to_string()))?;

        // Feed stdin concurrently so a full stdout pipe cannot stall us
        let png = bitmap.bytes().clone();
        let writer = tokio::spawn(async move {
            let written = stdin.write_all(&png).await;
            drop(stdin);
            written
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::Engine(format!("Failed to wait for tesseract: {}", e)))?;

        if let Ok(Err(e)) = writer.await {
            tracing::debug!("tesseract closed stdin early: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "Tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::InvalidOutput(format!("TSV is not UTF-8: {}", e)))?;

        tsv::parse(&stdout)
    }
}

/// Tesseract through the linked library
#[cfg(feature = "ocr-tesseract")]
pub struct TesseractLib {
    tessdata_dir: Option<String>,
    language: String,
}

#[cfg(feature = "ocr-tesseract")]
impl TesseractLib {
    /// `language` is the model probed by `is_available`
    pub fn new(tessdata_dir: Option<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            tessdata_dir: tessdata_dir.map(|p| p.to_string_lossy().into_owned()),
            language: language.into(),
        }
    }

    fn run(
        datapath: Option<&str>,
        png: &[u8],
        params: &RecognitionParams,
    ) -> Result<RecognitionResult, OcrError> {
        use tesseract::{PageSegMode, Tesseract};

        let mut api = Tesseract::new(datapath, Some(params.language.as_str()))
            .map_err(engine_err)?
            .set_image_from_mem(png)
            .map_err(engine_err)?;

        match params.page_seg_mode {
            super::types::PageSegMode::Auto => api.set_page_seg_mode(PageSegMode::PsmAuto),
        }

        let mut api = api.recognize().map_err(engine_err)?;
        let text = api.get_text().map_err(engine_err)?;
        let tsv = api.get_tsv_text(0).map_err(engine_err)?;

        let mut result = tsv::parse(&tsv)?;
        result.text = text;
        Ok(result)
    }
}

#[cfg(feature = "ocr-tesseract")]
fn engine_err(e: impl std::fmt::Display) -> OcrError {
    OcrError::Engine(e.to_string())
}

#[cfg(feature = "ocr-tesseract")]
#[async_trait]
impl OcrEngine for TesseractLib {
    fn name(&self) -> &'static str {
        "tesseract-lib"
    }

    async fn is_available(&self) -> bool {
        let datapath = self.tessdata_dir.clone();
        let language = self.language.clone();
        tokio::task::spawn_blocking(move || {
            tesseract::Tesseract::new(datapath.as_deref(), Some(language.as_str())).is_ok()
        })
        .await
        .unwrap_or(false)
    }

    async fn recognize(
        &self,
        bitmap: &CanonicalBitmap,
        params: &RecognitionParams,
    ) -> Result<RecognitionResult, OcrError> {
        let datapath = self.tessdata_dir.clone();
        let png = bitmap.bytes().clone();
        let params = params.clone();

        tokio::task::spawn_blocking(move || Self::run(datapath.as_deref(), &png, &params))
            .await
            .map_err(|e| OcrError::Engine(format!("Recognition task failed: {}", e)))?
    }
}

/// Fixed-output engine for tests
#[cfg(test)]
pub struct MockEngine {
    pub response: Result<RecognitionResult, String>,
    pub available: bool,
    pub delay: Option<std::time::Duration>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockEngine {
    pub fn returning(response: RecognitionResult) -> Self {
        Self {
            response: Ok(response),
            available: true,
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            ..Self::returning(RecognitionResult::default())
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl OcrEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(
        &self,
        _bitmap: &CanonicalBitmap,
        _params: &RecognitionParams,
    ) -> Result<RecognitionResult, OcrError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone().map_err(OcrError::Engine)
    }
}
