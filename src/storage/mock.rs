use super::StorageService;
use crate::models::{VariantKey, VariantTier};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    public_mount: String,
    failing_tier: Arc<Mutex<Option<VariantTier>>>,
    truncating_tier: Arc<Mutex<Option<VariantTier>>>,
    write_count: Arc<Mutex<usize>>,
    remove_count: Arc<Mutex<usize>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            public_mount: "/images".to_string(),
            failing_tier: Arc::new(Mutex::new(None)),
            truncating_tier: Arc::new(Mutex::new(None)),
            write_count: Arc::new(Mutex::new(0)),
            remove_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_public_mount(mut self, public_mount: String) -> Self {
        self.public_mount = public_mount;
        self
    }

    /// Make every write for `tier` fail with a storage error.
    pub fn with_failing_tier(self, tier: VariantTier) -> Self {
        *self.failing_tier.lock().unwrap() = Some(tier);
        self
    }

    /// Make writes for `tier` store half the bytes and then fail, like a disk
    /// filling up mid-write.
    pub fn with_truncating_tier(self, tier: VariantTier) -> Self {
        *self.truncating_tier.lock().unwrap() = Some(tier);
        self
    }

    pub fn with_file(self, relative_path: String, content: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(relative_path, content);
        self
    }

    pub fn get_write_count(&self) -> usize {
        *self.write_count.lock().unwrap()
    }

    pub fn get_remove_count(&self) -> usize {
        *self.remove_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorage {
    async fn write(&self, key: &VariantKey, data: &[u8]) -> Result<String> {
        *self.write_count.lock().unwrap() += 1;

        if *self.failing_tier.lock().unwrap() == Some(key.tier) {
            return Err(Error::Storage(format!(
                "Mock failure writing {}",
                key.relative_path()
            )));
        }

        if *self.truncating_tier.lock().unwrap() == Some(key.tier) {
            self.files
                .lock()
                .unwrap()
                .insert(key.relative_path(), data[..data.len() / 2].to_vec());
            return Err(Error::Storage(format!(
                "No space left on device writing {}",
                key.relative_path()
            )));
        }

        self.files
            .lock()
            .unwrap()
            .insert(key.relative_path(), data.to_vec());
        Ok(format!("{}/{}", self.public_mount, key.relative_path()))
    }

    async fn remove(&self, key: &VariantKey) -> Result<bool> {
        *self.remove_count.lock().unwrap() += 1;

        Ok(self
            .files
            .lock()
            .unwrap()
            .remove(&key.relative_path())
            .is_some())
    }
}
