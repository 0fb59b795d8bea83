//! Input validation
//!
//! Checks run strictly before any decode attempt: presence, declared type,
//! then size.

use crate::config::UploadConfig;
use crate::error::{PipelineError, Result};

use super::types::{ImageKind, UploadCandidate, UploadedImage};

/// Upload limits for one server instance
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: usize,
    allowed: Vec<ImageKind>,
}

impl UploadPolicy {
    pub fn new(max_bytes: usize, allowed: Vec<ImageKind>) -> Self {
        Self { max_bytes, allowed }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.max_bytes, config.allowed_types.clone())
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validate a candidate, or its absence
    pub fn validate(&self, candidate: Option<UploadCandidate>) -> Result<UploadedImage> {
        let candidate = candidate.ok_or(PipelineError::MissingFile)?;
        if candidate.bytes.is_empty() {
            return Err(PipelineError::MissingFile);
        }

        let kind = self.check_type(&candidate.declared_mime)?;
        self.check_size(candidate.bytes.len())?;

        Ok(UploadedImage::new(candidate.bytes, kind))
    }

    /// Reject declared MIME types outside the allowed set
    pub fn check_type(&self, declared_mime: &str) -> Result<ImageKind> {
        ImageKind::from_mime(declared_mime)
            .filter(|kind| self.allowed.contains(kind))
            .ok_or_else(|| PipelineError::UnsupportedType {
                mime: declared_mime.to_string(),
                allowed: self.allowed.iter().map(|k| k.label()).collect(),
            })
    }

    pub fn check_size(&self, len: usize) -> Result<()> {
        if len > self.max_bytes {
            return Err(PipelineError::TooLarge {
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}
