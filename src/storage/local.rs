use super::StorageService;
use crate::models::{Config, VariantKey};
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Filesystem storage rooted at the configured images directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_mount: String,
}

impl LocalStorage {
    /// # Arguments
    /// * `root` - Directory holding the `<folder>/<tier>/` trees (e.g. "public/images")
    /// * `public_mount` - URL prefix the static layer serves `root` under (e.g. "/images")
    pub fn new(root: impl Into<PathBuf>, public_mount: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_mount: public_mount.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.storage_root(), config.public_mount())
    }

    pub fn path_for(&self, key: &VariantKey) -> PathBuf {
        self.root
            .join(&key.folder)
            .join(key.tier.as_str())
            .join(key.file_name())
    }

    fn public_path(&self, key: &VariantKey) -> String {
        format!(
            "{}/{}",
            self.public_mount.trim_end_matches('/'),
            key.relative_path()
        )
    }
}

#[async_trait]
impl StorageService for LocalStorage {
    async fn write(&self, key: &VariantKey, data: &[u8]) -> Result<String> {
        let path = self.path_for(key);

        // create_dir_all tolerates a concurrent creator of the same directory.
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        fs::write(&path, data).await.map_err(|e| {
            Error::Storage(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), bytes = data.len(), "Wrote image variant");
        Ok(self.public_path(key))
    }

    async fn remove(&self, key: &VariantKey) -> Result<bool> {
        let path = self.path_for(key);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed image variant");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Storage(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
