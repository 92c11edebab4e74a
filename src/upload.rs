//! Upload receiver: pulls the single `file` part out of a multipart body.

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::Result;

/// Name of the form field carrying the image.
pub const FILE_FIELD: &str = "file";

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// An image received in one request. Lives only as long as that request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    /// Client-declared, untrusted.
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Read the multipart stream until the `file` part is found.
///
/// Returns `Ok(None)` when the body has no file part. Parts with other names,
/// and a `file` part without a filename, are skipped. Only the first file is
/// taken.
pub async fn receive_image(multipart: &mut Multipart) -> Result<Option<UploadedImage>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let has_filename = field.file_name().map(|n| !n.is_empty()).unwrap_or(false);
        if !has_filename {
            tracing::debug!("skipping `file` part without a filename");
            continue;
        }

        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let bytes = field.bytes().await?;
        let size_bytes = bytes.len();

        tracing::info!(mime_type = %mime_type, size_bytes, "received upload");

        return Ok(Some(UploadedImage {
            bytes,
            mime_type,
            size_bytes,
        }));
    }

    Ok(None)
}
