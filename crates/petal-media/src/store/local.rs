use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::{ObjectStore, StoreError, validate_segment};

/// Stores objects on local disk.
///
/// Each object is a flat file at `{root}/{bucket}/{name}`; the server mounts
/// `root` under the public base URL.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base: String,
}

impl LocalObjectStore {
    pub async fn new(root: PathBuf, public_base: impl Into<String>) -> Result<Self, StoreError> {
        fs::create_dir_all(&root).await?;
        info!("Object storage directory: {}", root.display());
        Ok(Self {
            root,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the file for a given object.
    pub fn object_path(&self, bucket: &str, name: &str) -> Result<PathBuf, StoreError> {
        validate_segment(bucket)?;
        validate_segment(name)?;
        Ok(self.root.join(bucket).join(name))
    }
}

impl ObjectStore for LocalObjectStore {
    async fn store(
        &self,
        bucket: &str,
        name: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, StoreError> {
        let path = self.object_path(bucket, name)?;
        fs::create_dir_all(self.root.join(bucket)).await?;

        let mut file = fs::File::create(&path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        info!("Stored {}/{} ({} bytes)", bucket, name, bytes.len());
        Ok(self.public_url(bucket, name))
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/{}/{}", self.public_base, bucket, name)
    }
}
