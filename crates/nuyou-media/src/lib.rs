//! Image uploads for the nuyou site backend.
//!
//! [`ImageUploads`] validates an uploaded image and stores it under a
//! generated name in the upload directory:
//!
//! 1. The declared MIME type must be one of the allowed image types.
//! 2. The payload must not exceed [`MAX_UPLOAD_BYTES`].
//! 3. The file signature is sniffed; the declared type is not trusted.
//! 4. The image header must decode far enough to read its dimensions.
//!
//! Stored names look like `img_3f2a..._1718000000.png`, with the extension
//! taken from the sniffed format rather than the client's file name.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::{ImageFormat, ImageReader};
use serde::Serialize;
use tempfile::NamedTempFile;

/// Maximum accepted upload size (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// MIME types a client may declare.
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Upload rejection or failure.
///
/// The `Display` text is safe to show to the uploader; it never contains
/// filesystem paths.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Declared or actual type is not an allowed image format.
    #[error("Invalid file type. Only JPG, PNG, GIF, and WebP allowed.")]
    InvalidType,

    /// Payload exceeds [`MAX_UPLOAD_BYTES`].
    #[error("File too large. Maximum size is 5MB.")]
    TooLarge {
        /// Received size in bytes.
        size: usize,
    },

    /// Signature matched but the image header could not be read.
    #[error("Invalid image file.")]
    Corrupt(#[source] image::ImageError),

    /// Writing the file failed.
    #[error("Failed to save uploaded file")]
    Io(#[from] std::io::Error),
}

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    /// Public URL of the file.
    pub url: String,
    /// Generated file name.
    pub name: String,
    /// Size in bytes.
    pub size: usize,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Upload directory plus the URL prefix it is served under.
#[derive(Debug, Clone)]
pub struct ImageUploads {
    dir: PathBuf,
    url_prefix: String,
}

impl ImageUploads {
    /// Create an upload target. The directory is created on first store.
    #[must_use]
    pub fn new(dir: PathBuf, url_prefix: &str) -> Self {
        Self {
            dir,
            url_prefix: url_prefix.trim_end_matches('/').to_owned(),
        }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Public URL prefix.
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Validate and store an uploaded image.
    ///
    /// `original_name` is only used for logging.
    pub fn store(
        &self,
        original_name: &str,
        declared_mime: &str,
        bytes: &[u8],
    ) -> Result<StoredImage, UploadError> {
        let format = validate(declared_mime, bytes).inspect_err(|e| {
            tracing::info!(original_name, declared_mime, size = bytes.len(), reason = %e, "Rejected upload");
        })?;

        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|e| {
                tracing::info!(original_name, error = %e, "Rejected undecodable upload");
                UploadError::Corrupt(e)
            })?;

        let name = generate_name(extension(format));
        self.write(&name, bytes).inspect_err(|e| {
            tracing::error!(dir = %self.dir.display(), name = %name, error = %e, "Failed to write upload");
        })?;

        tracing::info!(original_name, name = %name, width, height, size = bytes.len(), "Stored upload");

        Ok(StoredImage {
            url: format!("{}/{name}", self.url_prefix),
            name,
            size: bytes.len(),
            width,
            height,
        })
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.dir.join(name)).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Check declared type, size, and actual signature.
///
/// Returns the sniffed format on success.
pub fn validate(declared_mime: &str, bytes: &[u8]) -> Result<ImageFormat, UploadError> {
    let declared = declared_mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&declared.as_str()) {
        return Err(UploadError::InvalidType);
    }

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size: bytes.len() });
    }

    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP)) => {
            Ok(format)
        }
        _ => Err(UploadError::InvalidType),
    }
}

fn extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        _ => "png",
    }
}

/// Random token plus timestamp, e.g. `img_<32 hex>_<unix seconds>.png`.
fn generate_name(ext: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("img_{}_{secs}.{ext}", uuid::Uuid::new_v4().simple())
}
