//! Facade exposing the three image operations to the request layer.

use crate::image::{decoder, transformer, VariantGenerator};
use crate::models::{
    validate_folder, Config, DeleteVariantsRequest, DeleteVariantsResponse, SaveVariantsRequest,
    StoredVariantSet, TransformRequest, TransformResponse,
};
use crate::storage::{LocalStorage, StorageService};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Orchestrates decoding, transforming, variant generation and storage.
pub struct ImageVariantService {
    storage: Arc<dyn StorageService>,
    variants: VariantGenerator,
    max_payload_bytes: usize,
}

impl ImageVariantService {
    /// Build a service writing to the local filesystem described by `config`.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        info!(root = %config.storage_root().display(), "Using local image storage");
        Ok(Self::with_storage(
            Arc::new(LocalStorage::from_config(config)),
            config.max_payload_bytes,
        ))
    }

    /// Build a service over any storage backend; used by tests to inject mocks.
    pub fn with_storage(storage: Arc<dyn StorageService>, max_payload_bytes: usize) -> Self {
        Self {
            variants: VariantGenerator::new(Arc::clone(&storage)),
            storage,
            max_payload_bytes,
        }
    }

    /// Decode, optionally resize/re-encode, and return the image without storing it.
    pub async fn transform(&self, request: TransformRequest) -> Result<TransformResponse> {
        let image = decoder::decode(&request.image, self.max_payload_bytes)?;
        let ops = request.operations.unwrap_or_default();

        let image = tokio::task::spawn_blocking(move || transformer::transform(&image, &ops))
            .await
            .map_err(|e| Error::Invariant(format!("Transform task join error: {}", e)))??;

        Ok(TransformResponse { image })
    }

    /// Store the small, medium and large renditions of an image under `folder`.
    pub async fn save_variants(&self, request: SaveVariantsRequest) -> Result<StoredVariantSet> {
        validate_folder(&request.folder)?;
        let image = decoder::decode(&request.image, self.max_payload_bytes)?;

        info!(
            folder = %request.folder,
            mime = %image.mime,
            bytes = image.data.len(),
            "Saving image variants"
        );
        self.variants.generate(image, &request.folder).await
    }

    /// Remove every tier of a previously saved image. Missing files are not an error.
    pub async fn delete_variants(
        &self,
        request: DeleteVariantsRequest,
    ) -> Result<DeleteVariantsResponse> {
        self.storage
            .remove_variants(&request.folder, &request.image_path)
            .await?;

        info!(folder = %request.folder, path = %request.image_path, "Deleted image variants");
        Ok(DeleteVariantsResponse { ok: true })
    }
}
