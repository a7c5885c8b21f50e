use super::{codec, ImageCodec};
use crate::models::{validate_folder, DecodedImage, StoredVariantSet, VariantKey, VariantTier};
use crate::storage::StorageService;
use crate::{Error, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct RenderedVariant {
    pub tier: VariantTier,
    pub data: Vec<u8>,
}

fn render_tier(
    img: &DynamicImage,
    tier: VariantTier,
    codec: ImageCodec,
) -> Result<RenderedVariant> {
    let size = tier.size();
    // Cover-fit: scale to fill the square, then center-crop the overflow.
    let square = img.resize_to_fill(size, size, FilterType::Lanczos3);
    Ok(RenderedVariant {
        tier,
        data: codec::encode(&square, codec)?,
    })
}

/// Decode once and render every tier in the source codec, small to large.
pub fn render_tiers(image: &DecodedImage) -> Result<[RenderedVariant; 3]> {
    let img = codec::load(&image.data, image.codec)?;
    let [small, medium, large] = VariantTier::ALL.map(|tier| render_tier(&img, tier, image.codec));
    Ok([small?, medium?, large?])
}

/// Renders the fixed tiers of an image and persists them all-or-nothing.
pub struct VariantGenerator {
    storage: Arc<dyn StorageService>,
}

impl VariantGenerator {
    pub fn new(storage: Arc<dyn StorageService>) -> Self {
        Self { storage }
    }

    async fn write_tier(&self, key: VariantKey, data: &[u8]) -> (VariantKey, Result<String>) {
        let result = self.storage.write(&key, data).await;
        (key, result)
    }

    /// Remove every key of a failed call, including the tier whose write failed:
    /// a failed write may still leave a truncated file behind.
    async fn rollback(&self, keys: &[VariantKey]) {
        for key in keys {
            match self.storage.remove(key).await {
                Ok(true) => info!(path = %key.relative_path(), "Rolled back variant"),
                Ok(false) => {}
                Err(e) => warn!(path = %key.relative_path(), "Failed to roll back variant: {}", e),
            }
        }
    }

    pub async fn generate(&self, image: DecodedImage, folder: &str) -> Result<StoredVariantSet> {
        validate_folder(folder)?;

        let filename = Uuid::new_v4().simple().to_string();
        let extension = image.codec.extension();

        let [small, medium, large] = tokio::task::spawn_blocking(move || render_tiers(&image))
            .await
            .map_err(|e| Error::Invariant(format!("Variant rendering task join error: {}", e)))??;

        let key = |tier| VariantKey::new(folder, tier, &filename, extension);
        let (small_key, medium_key, large_key) =
            (key(small.tier)?, key(medium.tier)?, key(large.tier)?);

        // Tier directories are disjoint, so the writes can run side by side.
        let results = tokio::join!(
            self.write_tier(small_key, &small.data),
            self.write_tier(medium_key, &medium.data),
            self.write_tier(large_key, &large.data)
        );

        let mut stored = StoredVariantSet::default();
        let mut attempted = Vec::with_capacity(VariantTier::ALL.len());
        let mut failure = None;
        for (key, result) in [results.0, results.1, results.2] {
            match result {
                Ok(path) => stored.set(key.tier, path),
                Err(e) => {
                    warn!(path = %key.relative_path(), "Variant write failed: {}", e);
                    failure.get_or_insert(e);
                }
            }
            attempted.push(key);
        }

        if let Some(err) = failure {
            self.rollback(&attempted).await;
            return Err(err);
        }

        info!(folder = %folder, filename = %filename, "Stored image variants");
        Ok(stored)
    }
}
