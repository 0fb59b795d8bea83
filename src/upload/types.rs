//! Upload types

use axum::body::Bytes;

// ============================================================================
// Constants
// ============================================================================

/// Maximum upload size: 5MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Multipart form field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Extra body allowance for multipart boundaries and part headers
pub const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

// ============================================================================
// Image Kinds
// ============================================================================

/// Image encodings accepted at the upload boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    pub const ALL: [ImageKind; 3] = [ImageKind::Jpeg, ImageKind::Png, ImageKind::Webp];

    /// Parse a declared MIME type (parameters such as `; charset=` are ignored)
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// Codec format used to decode this kind
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
        }
    }

    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    /// Short uppercase label used in user-facing messages
    pub fn label(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Webp => "WEBP",
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

// ============================================================================
// Upload Types
// ============================================================================

/// What the multipart reader hands to the validator
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    /// Raw file bytes
    pub bytes: Bytes,
    /// Content type from the part headers (empty when absent)
    pub declared_mime: String,
    /// Original file name, for logging only
    pub file_name: Option<String>,
}

/// An upload that passed validation
///
/// Owned by a single request and dropped once normalized.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    bytes: Bytes,
    kind: ImageKind,
    declared_size: usize,
}

impl UploadedImage {
    pub(crate) fn new(bytes: Bytes, kind: ImageKind) -> Self {
        let declared_size = bytes.len();
        Self {
            bytes,
            kind,
            declared_size,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Declared (validated) MIME kind
    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.declared_size
    }
}
