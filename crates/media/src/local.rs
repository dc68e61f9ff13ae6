//! Filesystem-backed image store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use campos_core::media::{ImageStore, ImageStoreError, UploadFile};
use campos_core::property::PropertyImage;

use crate::object_name;

/// Stores images as files in `root`. The object id is the file name and the
/// URL is `<public_base>/<file name>`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    /// Create the store, making sure `root` exists.
    pub async fn new(
        root: impl Into<PathBuf>,
        public_base: &str,
    ) -> Result<Self, ImageStoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object id to a path inside `root`, refusing anything that
    /// could escape it.
    fn path_for(&self, object_id: &str) -> Result<PathBuf, ImageStoreError> {
        let valid = !object_id.is_empty()
            && !object_id.contains(['/', '\\'])
            && object_id != "."
            && object_id != "..";
        if !valid {
            return Err(ImageStoreError::Rejected(format!(
                "invalid object id '{object_id}'"
            )));
        }
        Ok(self.root.join(object_id))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(&self, file: &UploadFile) -> Result<PropertyImage, ImageStoreError> {
        let name = object_name(file);
        let path = self.path_for(&name)?;
        tokio::fs::write(&path, &file.data).await?;

        tracing::debug!(
            filename = %file.filename,
            object_id = %name,
            bytes = file.data.len(),
            "Image stored on disk"
        );
        Ok(PropertyImage {
            url: format!("{}/{name}", self.public_base),
            object_id: name,
        })
    }

    async fn delete(&self, object_id: &str) -> Result<(), ImageStoreError> {
        let path = self.path_for(object_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
