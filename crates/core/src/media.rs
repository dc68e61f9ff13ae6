//! Image upload contract.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::property::PropertyImage;

/// Maximum number of image files accepted in one create/update request.
pub const MAX_IMAGES_PER_REQUEST: usize = 15;

/// Accepted image file extensions (lowercase).
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif"];

/// A file received from the client, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadFile {
    /// Lowercase extension of the original file name, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.filename.rsplit_once('.')?;
        Some(ext.to_lowercase())
    }
}

/// Reject files that are empty or do not look like a supported image.
pub fn validate_upload(file: &UploadFile) -> Result<(), CoreError> {
    if file.data.is_empty() {
        return Err(CoreError::Validation(format!(
            "Image '{}' is empty",
            file.filename
        )));
    }
    match file.extension() {
        Some(ext) if SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(CoreError::Validation(format!(
            "Unsupported image '{}'. Supported: {}",
            file.filename,
            SUPPORTED_IMAGE_EXTENSIONS.join(", ")
        ))),
    }
}

/// Validate a whole batch of uploads, including the per-request limit.
pub fn validate_uploads(files: &[UploadFile]) -> Result<(), CoreError> {
    if files.len() > MAX_IMAGES_PER_REQUEST {
        return Err(CoreError::Validation(format!(
            "At most {MAX_IMAGES_PER_REQUEST} images per request, got {}",
            files.len()
        )));
    }
    files.iter().try_for_each(validate_upload)
}

#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    #[error("Image store unavailable: {0}")]
    Unavailable(String),

    #[error("Image rejected by store: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// External object store holding property images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the file and return its public URL and object id.
    async fn upload(&self, file: &UploadFile) -> Result<PropertyImage, ImageStoreError>;

    /// Remove an object. Deleting an id that does not exist is not an error.
    async fn delete(&self, object_id: &str) -> Result<(), ImageStoreError>;
}
