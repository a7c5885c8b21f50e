//! Data models and structures
//!
//! Defines the image payloads, transform operations, variant tiers and the
//! request/response shapes exchanged with the request layer, plus the
//! process-wide configuration.

use crate::image::ImageCodec;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Binary image payload plus the MIME type it was declared with.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub mime: String,
    pub codec: ImageCodec,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VariantTier {
    Small,
    Medium,
    Large,
}

impl VariantTier {
    /// Write order used when tiers are listed.
    pub const ALL: [VariantTier; 3] = [VariantTier::Small, VariantTier::Medium, VariantTier::Large];

    /// Edge length of the square rendition, in pixels.
    pub fn size(self) -> u32 {
        match self {
            VariantTier::Small => 50,
            VariantTier::Medium => 512,
            VariantTier::Large => 1024,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VariantTier::Small => "small",
            VariantTier::Medium => "medium",
            VariantTier::Large => "large",
        }
    }
}

impl fmt::Display for VariantTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one stored rendition: `<folder>/<tier>/<filename>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub folder: String,
    pub tier: VariantTier,
    pub filename: String,
    pub extension: String,
}

impl VariantKey {
    pub fn new(folder: &str, tier: VariantTier, filename: &str, extension: &str) -> Result<Self> {
        validate_folder(folder)?;
        Ok(Self {
            folder: folder.to_string(),
            tier,
            filename: filename.to_string(),
            extension: extension.to_string(),
        })
    }

    /// Rebuild a key from any public path previously returned for `folder`.
    ///
    /// Only the last path segment is used; all tiers share the same file name,
    /// so the tier segment of `path` is irrelevant.
    pub fn from_public_path(folder: &str, tier: VariantTier, path: &str) -> Result<Self> {
        let name = path.rsplit('/').next().unwrap_or_default();
        let (filename, extension) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => (name, ""),
        };

        let valid_stem = !filename.is_empty()
            && filename
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let valid_ext = extension.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid_stem || !valid_ext {
            return Err(Error::validation("invalid image path"));
        }

        Self::new(folder, tier, filename, extension)
    }

    pub fn with_tier(&self, tier: VariantTier) -> Self {
        Self {
            tier,
            ..self.clone()
        }
    }

    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.filename.clone()
        } else {
            format!("{}.{}", self.filename, self.extension)
        }
    }

    pub fn relative_path(&self) -> String {
        format!("{}/{}/{}", self.folder, self.tier, self.file_name())
    }
}

/// Folder names are `/`-separated segments of `[A-Za-z0-9_-]+`.
pub fn validate_folder(folder: &str) -> Result<()> {
    let valid = !folder.is_empty()
        && folder.split('/').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(Error::validation("invalid folder"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResizeOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Optional transform applied by the one-shot transform operation.
///
/// `format` stays a free-form string: unrecognised names are ignored rather
/// than rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRequest {
    pub image: String,
    #[serde(default)]
    pub operations: Option<TransformOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResponse {
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveVariantsRequest {
    pub folder: String,
    pub image: String,
}

/// Public paths of the three renditions of one stored image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredVariantSet {
    pub small: String,
    pub medium: String,
    pub large: String,
}

impl StoredVariantSet {
    pub fn get(&self, tier: VariantTier) -> &str {
        match tier {
            VariantTier::Small => &self.small,
            VariantTier::Medium => &self.medium,
            VariantTier::Large => &self.large,
        }
    }

    pub fn set(&mut self, tier: VariantTier, path: String) {
        match tier {
            VariantTier::Small => self.small = path,
            VariantTier::Medium => self.medium = path,
            VariantTier::Large => self.large = path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVariantsRequest {
    pub folder: String,
    pub image_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteVariantsResponse {
    pub ok: bool,
}

// Configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory exposed by the static-file layer.
    pub public_dir: PathBuf,
    /// Root folder name under `public_dir`; also the public mount point.
    pub images_root: String,
    pub max_payload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            images_root: "images".to_string(),
            max_payload_bytes: Self::DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl Config {
    pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let public_dir = lookup("IMAGES_PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.public_dir);
        let images_root = lookup("IMAGES_ROOT").unwrap_or(defaults.images_root);
        let max_payload_bytes = match lookup("IMAGES_MAX_PAYLOAD_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("IMAGES_MAX_PAYLOAD_BYTES is not a number: {}", raw))
            })?,
            None => defaults.max_payload_bytes,
        };

        let config = Self {
            public_dir,
            images_root,
            max_payload_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_folder(&self.images_root)
            .map_err(|_| Error::Config(format!("invalid IMAGES_ROOT: {}", self.images_root)))?;
        if self.max_payload_bytes == 0 {
            return Err(Error::Config(
                "IMAGES_MAX_PAYLOAD_BYTES must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Filesystem directory that holds every `<folder>/<tier>/` tree.
    pub fn storage_root(&self) -> PathBuf {
        self.public_dir.join(&self.images_root)
    }

    /// URL prefix under which stored files are served.
    pub fn public_mount(&self) -> String {
        format!("/{}", self.images_root)
    }
}
