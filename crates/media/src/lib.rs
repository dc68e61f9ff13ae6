//! Image store implementations.
//!
//! - [`LocalImageStore`] writes files under a directory the API serves at
//!   `/uploads`.
//! - [`S3ImageStore`] puts objects into an S3-compatible bucket.

pub mod local;
pub mod s3;

pub use local::LocalImageStore;
pub use s3::{S3ImageStore, S3Settings};

use campos_core::media::UploadFile;

/// New object name for `file`: a random UUID plus its lowercase extension.
pub(crate) fn object_name(file: &UploadFile) -> String {
    let ext = file.extension().unwrap_or_else(|| "jpg".to_string());
    format!("{}.{ext}", uuid::Uuid::new_v4())
}

/// Content type for `file`, inferred from its extension when the client did
/// not send one.
pub(crate) fn content_type(file: &UploadFile) -> String {
    if let Some(ct) = file.content_type.as_deref().filter(|ct| ct.starts_with("image/")) {
        return ct.to_string();
    }
    match file.extension().as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
    .to_string()
}
