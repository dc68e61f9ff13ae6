//! Reconciles a property's image set against a keep list and new uploads.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::error::CoreError;
use crate::media::{ImageStore, UploadFile};
use crate::property::PropertyImage;

/// Outcome of staging an image update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageReconciliation {
    /// Kept images in their original order, followed by new uploads in
    /// upload order.
    pub final_images: Vec<PropertyImage>,
    /// Existing images whose URL was not in the keep list.
    pub to_delete: Vec<PropertyImage>,
}

/// Split `existing` into images to keep and images to release.
pub fn partition_images(
    existing: &[PropertyImage],
    keep_urls: &[String],
) -> (Vec<PropertyImage>, Vec<PropertyImage>) {
    existing
        .iter()
        .cloned()
        .partition(|img| keep_urls.iter().any(|u| u == &img.url))
}

/// Uploads and releases images through an [`ImageStore`].
#[derive(Clone)]
pub struct ImageSetReconciler {
    store: Arc<dyn ImageStore>,
    upload_timeout: Duration,
}

impl ImageSetReconciler {
    pub fn new(store: Arc<dyn ImageStore>, upload_timeout: Duration) -> Self {
        Self {
            store,
            upload_timeout,
        }
    }

    /// Upload every file concurrently. The result mirrors input order.
    ///
    /// Fails with [`CoreError::UploadFailed`] if any upload fails or the batch
    /// exceeds the upload timeout. Files that did upload before the failure
    /// stay in the store; their object ids are logged.
    pub async fn upload_all(&self, files: &[UploadFile]) -> Result<Vec<PropertyImage>, CoreError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let uploads = join_all(files.iter().map(|f| self.store.upload(f)));
        let results = tokio::time::timeout(self.upload_timeout, uploads)
            .await
            .map_err(|_| {
                tracing::error!(
                    files = files.len(),
                    timeout_secs = self.upload_timeout.as_secs(),
                    "Image upload batch timed out"
                );
                CoreError::UploadFailed(format!(
                    "uploads did not finish within {}s",
                    self.upload_timeout.as_secs()
                ))
            })?;

        let mut uploaded = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(image) => uploaded.push(image),
                Err(e) => {
                    tracing::error!(filename = %file.filename, error = %e, "Image upload failed");
                    first_error.get_or_insert(CoreError::UploadFailed(format!(
                        "{}: {e}",
                        file.filename
                    )));
                }
            }
        }

        match first_error {
            None => Ok(uploaded),
            Some(err) => {
                for orphan in &uploaded {
                    tracing::warn!(object_id = %orphan.object_id, "Orphaned image left in store after failed batch");
                }
                Err(err)
            }
        }
    }

    /// Compute the final image set and upload new files.
    ///
    /// `keep_urls = None` keeps every existing image. Nothing is deleted
    /// here; pass [`ImageReconciliation::to_delete`] to [`release`](Self::release)
    /// once the record is saved.
    pub async fn stage(
        &self,
        existing: &[PropertyImage],
        keep_urls: Option<&[String]>,
        files: &[UploadFile],
    ) -> Result<ImageReconciliation, CoreError> {
        let (mut final_images, to_delete) = match keep_urls {
            Some(keep) => partition_images(existing, keep),
            None => (existing.to_vec(), Vec::new()),
        };

        final_images.extend(self.upload_all(files).await?);

        Ok(ImageReconciliation {
            final_images,
            to_delete,
        })
    }

    /// Best-effort deletion of `images` from the store. Failures are logged
    /// and swallowed.
    pub async fn release(&self, images: &[PropertyImage]) {
        for image in images {
            if let Err(e) = self.store.delete(&image.object_id).await {
                tracing::warn!(
                    object_id = %image.object_id,
                    error = %e,
                    "Could not delete image from store"
                );
            }
        }
    }
}
