//! Upload Module
//!
//! Turns a multipart request into a validated [`UploadedImage`].
//!
//! The declared type is checked from the part headers before any bytes are
//! buffered, and the size limit is enforced while streaming, so oversize or
//! wrongly typed uploads are refused without ever reaching the decoder.

mod types;
mod validator;

pub use types::{
    ImageKind, UploadCandidate, UploadedImage, DEFAULT_MAX_UPLOAD_BYTES, IMAGE_FIELD,
    MULTIPART_SLACK_BYTES,
};
pub use validator::UploadPolicy;

use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::error::{PipelineError, Result};

/// Read the `image` field from a multipart request and validate it
///
/// Fields with other names are skipped, as are `image` parts without a file
/// name, which are plain form values. Only the first `image` file is used.
pub async fn read_image(
    multipart: std::result::Result<Multipart, MultipartRejection>,
    policy: &UploadPolicy,
) -> Result<UploadedImage> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!("Request is not a multipart upload: {}", rejection);
            return policy.validate(None);
        }
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, policy))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != IMAGE_FIELD {
            tracing::debug!("Skipping multipart field '{}'", name);
            continue;
        }

        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            tracing::debug!("Skipping '{}' field without a file name", name);
            continue;
        };
        let declared_mime = field.content_type().unwrap_or("").to_string();

        // Refuse the type before buffering anything
        policy.check_type(&declared_mime)?;

        let bytes = read_limited(field, policy).await?;

        tracing::debug!(
            file_name = %file_name,
            mime = %declared_mime,
            size = bytes.len(),
            "Received image field"
        );

        return policy.validate(Some(UploadCandidate {
            bytes,
            declared_mime,
            file_name: Some(file_name),
        }));
    }

    policy.validate(None)
}

/// Buffer a field, failing as soon as it grows past the limit
async fn read_limited(mut field: Field<'_>, policy: &UploadPolicy) -> Result<Bytes> {
    let mut buffer = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, policy))?
    {
        policy.check_size(buffer.len() + chunk.len())?;
        buffer.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buffer))
}

fn multipart_error(err: MultipartError, policy: &UploadPolicy) -> PipelineError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return PipelineError::TooLarge {
            max: policy.max_bytes(),
        };
    }

    // A body we cannot parse carries no usable file
    tracing::debug!("Failed to read multipart body: {}", err);
    PipelineError::MissingFile
}
