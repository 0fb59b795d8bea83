//! Format normalization
//!
//! Decodes a validated upload and re-encodes it as an 8-bit PNG, the one
//! encoding handed to the recognition engine.

use std::io::Cursor;

use axum::body::Bytes;
use image::{DynamicImage, ImageFormat, ImageReader, Limits};

use crate::upload::{ImageKind, UploadedImage};

/// Normalization errors
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Image data is not a recognizable image")]
    UnrecognizedFormat,

    #[error("Unsupported image format: {0:?}")]
    UnsupportedFormat(ImageFormat),

    #[error("Failed to decode {kind} image: {source}")]
    Decode {
        kind: ImageKind,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode canonical bitmap: {0}")]
    Encode(#[source] image::ImageError),
}

/// PNG bytes guaranteed decodable by the recognition engine
#[derive(Debug, Clone)]
pub struct CanonicalBitmap {
    png: Bytes,
    width: u32,
    height: u32,
}

impl CanonicalBitmap {
    pub fn bytes(&self) -> &Bytes {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Decoder/encoder with per-instance dimension limits
#[derive(Debug, Clone)]
pub struct Normalizer {
    max_dimension: u32,
}

impl Normalizer {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Decode by sniffed format (falling back to the declared one) and
    /// re-encode as PNG. CPU bound; call from a blocking context.
    pub fn normalize(&self, upload: &UploadedImage) -> Result<CanonicalBitmap, NormalizeError> {
        let kind = self.detect_kind(upload)?;

        if kind != upload.kind() {
            tracing::debug!(
                declared = %upload.kind(),
                sniffed = %kind,
                "Declared type differs from image content, decoding as sniffed"
            );
        }

        let mut reader =
            ImageReader::with_format(Cursor::new(upload.bytes().as_ref()), kind.image_format());
        reader.limits(self.limits());

        let decoded = reader
            .decode()
            .map_err(|source| NormalizeError::Decode { kind, source })?;

        let canonical = to_eight_bit(decoded);
        let (width, height) = (canonical.width(), canonical.height());

        let mut png = Vec::new();
        canonical
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(NormalizeError::Encode)?;

        Ok(CanonicalBitmap {
            png: Bytes::from(png),
            width,
            height,
        })
    }

    fn detect_kind(&self, upload: &UploadedImage) -> Result<ImageKind, NormalizeError> {
        match image::guess_format(upload.bytes()) {
            Ok(format) => {
                ImageKind::from_image_format(format).ok_or(NormalizeError::UnsupportedFormat(format))
            }
            // Too short or unknown magic: let the declared decoder produce the error
            Err(_) if !upload.bytes().is_empty() => Ok(upload.kind()),
            Err(_) => Err(NormalizeError::UnrecognizedFormat),
        }
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        limits
    }
}

/// Collapse 16-bit and float buffers to 8 bits per channel
fn to_eight_bit(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => image,
        DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
        DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::upload::{UploadCandidate, UploadPolicy};
    use image::{ImageBuffer, Luma, Rgb, RgbImage};

    /// Encode a small gradient in the given format
    pub(crate) fn sample_image(format: ImageFormat) -> Vec<u8> {
        let img: RgbImage =
            ImageBuffer::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 128]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), format)
            .unwrap();
        out
    }

    fn upload(bytes: Vec<u8>, mime: &str) -> UploadedImage {
        UploadPolicy::new(usize::MAX, ImageKind::ALL.to_vec())
            .validate(Some(UploadCandidate {
                bytes: Bytes::from(bytes),
                declared_mime: mime.to_string(),
                file_name: None,
            }))
            .unwrap()
    }

    fn assert_png(bitmap: &CanonicalBitmap) {
        assert_eq!(image::guess_format(bitmap.bytes()).unwrap(), ImageFormat::Png);
        let decoded =
            image::load_from_memory_with_format(bitmap.bytes(), ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_supported_formats_normalize_to_png() {
        let normalizer = Normalizer::new(10_000);
        for (format, mime) in [
            (ImageFormat::Png, "image/png"),
            (ImageFormat::Jpeg, "image/jpeg"),
            (ImageFormat::WebP, "image/webp"),
        ] {
            let bitmap = normalizer.normalize(&upload(sample_image(format), mime)).unwrap();
            assert_png(&bitmap);
            assert_eq!((bitmap.width(), bitmap.height()), (32, 24));
        }
    }

    #[test]
    fn test_mismatched_declared_type_decodes_by_content() {
        let normalizer = Normalizer::new(10_000);
        let bitmap = normalizer
            .normalize(&upload(sample_image(ImageFormat::Jpeg), "image/png"))
            .unwrap();
        assert_png(&bitmap);
    }

    #[test]
    fn test_truncated_png_fails() {
        let mut bytes = sample_image(ImageFormat::Png);
        bytes.truncate(bytes.len() / 2);

        let result = Normalizer::new(10_000).normalize(&upload(bytes, "image/png"));
        assert!(matches!(result, Err(NormalizeError::Decode { .. })));
    }

    #[test]
    fn test_garbage_fails() {
        let garbage = upload(b"not an image at all".to_vec(), "image/jpeg");
        let result = Normalizer::new(10_000).normalize(&garbage);
        assert!(matches!(
            result,
            Err(NormalizeError::Decode { kind: ImageKind::Jpeg, .. })
        ));
    }

    #[test]
    fn test_other_format_content_rejected() {
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec();
        let result = Normalizer::new(10_000).normalize(&upload(gif, "image/png"));
        assert!(matches!(result, Err(NormalizeError::UnsupportedFormat(ImageFormat::Gif))));
    }

    #[test]
    fn test_dimension_limit() {
        let png = upload(sample_image(ImageFormat::Png), "image/png");
        let result = Normalizer::new(16).normalize(&png);
        assert!(matches!(result, Err(NormalizeError::Decode { .. })));
    }

    #[test]
    fn test_sixteen_bit_collapsed() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(32, 24, |x, _| Luma([x as u16 * 2000]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma16(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let bitmap = Normalizer::new(10_000).normalize(&upload(bytes, "image/png")).unwrap();
        let decoded = image::load_from_memory(bitmap.bytes()).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
    }
}
