//! S3-compatible image store.

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use campos_core::media::{ImageStore, ImageStoreError, UploadFile};
use campos_core::property::PropertyImage;

use crate::{content_type, object_name};

/// Key prefix for every property image.
const KEY_PREFIX: &str = "properties";

/// Connection settings for [`S3ImageStore`].
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, Spaces).
    pub endpoint: Option<String>,
    /// Public origin objects are served from, e.g. a CDN. Defaults to the
    /// virtual-hosted bucket URL.
    pub public_base_url: Option<String>,
}

impl S3Settings {
    fn public_base(&self) -> String {
        match &self.public_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                self.bucket, self.region
            ),
        }
    }
}

/// Stores images as objects under `properties/` in a bucket. The object id
/// is the key.
#[derive(Debug, Clone)]
pub struct S3ImageStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base: String,
}

impl S3ImageStore {
    /// Build a client from the default AWS credential chain.
    pub async fn connect(settings: S3Settings) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            public_base: settings.public_base(),
            bucket: settings.bucket,
        }
    }

    fn key_for(file: &UploadFile) -> String {
        format!("{KEY_PREFIX}/{}", object_name(file))
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(&self, file: &UploadFile) -> Result<PropertyImage, ImageStoreError> {
        let key = Self::key_for(file);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type(file))
            .body(ByteStream::from(file.data.clone()))
            .send()
            .await
            .map_err(|e| ImageStoreError::Unavailable(DisplayErrorContext(e).to_string()))?;

        tracing::debug!(filename = %file.filename, key = %key, "Image uploaded to bucket");
        Ok(PropertyImage {
            url: format!("{}/{key}", self.public_base),
            object_id: key,
        })
    }

    async fn delete(&self, object_id: &str) -> Result<(), ImageStoreError> {
        // S3 DeleteObject succeeds for missing keys.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_id)
            .send()
            .await
            .map_err(|e| ImageStoreError::Unavailable(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }
}
