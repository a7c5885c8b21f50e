//! Persistence of image variants
//!
//! Each rendition lives at `<root>/<folder>/<tier>/<filename>.<ext>` and is
//! addressed through a [`VariantKey`].

pub mod local;
pub mod mock;

pub use local::LocalStorage;
pub use mock::MockStorage;

use crate::models::{VariantKey, VariantTier};
use crate::Result;
use async_trait::async_trait;
use tracing::{info, warn};

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Persist one rendition and return its web-servable path.
    async fn write(&self, key: &VariantKey, data: &[u8]) -> Result<String>;

    /// Delete one rendition. Returns `false` when it was already gone.
    async fn remove(&self, key: &VariantKey) -> Result<bool>;

    /// Delete every tier of the image `image_path` refers to.
    ///
    /// Missing files are logged and skipped, so calling this twice succeeds.
    /// Every tier is attempted; the first genuine fault is returned afterwards.
    async fn remove_variants(&self, folder: &str, image_path: &str) -> Result<()> {
        let key = VariantKey::from_public_path(folder, VariantTier::Small, image_path)?;

        let mut failure = None;
        for tier in VariantTier::ALL {
            let tier_key = key.with_tier(tier);
            match self.remove(&tier_key).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(path = %tier_key.relative_path(), "Variant already absent, skipping")
                }
                Err(e) => {
                    warn!(path = %tier_key.relative_path(), "Failed to remove variant: {}", e);
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
