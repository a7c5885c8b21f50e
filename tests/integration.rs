use base64::Engine as _;
use club_image_variants::{
    models::{
        Config, DeleteVariantsRequest, ResizeOperation, SaveVariantsRequest, StoredVariantSet,
        TransformOperation, TransformRequest, VariantTier,
    },
    storage::{LocalStorage, MockStorage},
    ImageVariantService,
};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

fn data_url(subtype: &str, bytes: &[u8]) -> String {
    format!(
        "data:image/{};base64,{}",
        subtype,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn test_config(dir: &TempDir) -> Config {
    Config {
        public_dir: dir.path().join("public"),
        images_root: "images".to_string(),
        max_payload_bytes: Config::DEFAULT_MAX_PAYLOAD_BYTES,
    }
}

/// Map a returned public path (`/images/...`) back to the file on disk.
fn disk_path(config: &Config, public_path: &str) -> std::path::PathBuf {
    config.public_dir.join(public_path.trim_start_matches('/'))
}

fn count_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

async fn save(service: &ImageVariantService, folder: &str, image: String) -> StoredVariantSet {
    service
        .save_variants(SaveVariantsRequest {
            folder: folder.to_string(),
            image,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_saved_variants_have_exact_tier_dimensions() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let service = ImageVariantService::new(&config).unwrap();

    let png = create_test_image(300, 200, ImageFormat::Png);
    let stored = save(&service, "athletes", data_url("png", &png)).await;

    for tier in VariantTier::ALL {
        let public_path = stored.get(tier);
        assert!(public_path.starts_with(&format!("/images/athletes/{}/", tier)));

        let img = image::open(disk_path(&config, public_path)).unwrap();
        assert_eq!((img.width(), img.height()), (tier.size(), tier.size()));
    }
}

#[tokio::test]
async fn test_jpeg_variants_use_jpg_extension() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let service = ImageVariantService::new(&config).unwrap();

    let jpeg = create_test_image(64, 100, ImageFormat::Jpeg);
    let stored = save(&service, "coaches", data_url("jpeg", &jpeg)).await;

    assert!(stored.large.ends_with(".jpg"));
    let img = image::open(disk_path(&config, &stored.large)).unwrap();
    assert_eq!((img.width(), img.height()), (1024, 1024));
}

#[tokio::test]
async fn test_delete_removes_all_tiers_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let service = ImageVariantService::new(&config).unwrap();

    let png = create_test_image(40, 40, ImageFormat::Png);
    let stored = save(&service, "clubs", data_url("png", &png)).await;
    assert_eq!(count_files(&config.storage_root()), 3);

    for _ in 0..2 {
        let response = service
            .delete_variants(DeleteVariantsRequest {
                folder: "clubs".to_string(),
                image_path: stored.small.clone(),
            })
            .await
            .unwrap();
        assert!(response.ok);
    }

    for tier in VariantTier::ALL {
        assert!(!disk_path(&config, stored.get(tier)).exists());
    }
    assert_eq!(count_files(&config.storage_root()), 0);
}

#[tokio::test]
async fn test_concurrent_saves_to_distinct_folders_do_not_overlap() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let service = ImageVariantService::new(&config).unwrap();
    let png = create_test_image(50, 80, ImageFormat::Png);

    let (athletes, schedules) = tokio::join!(
        save(&service, "athletes", data_url("png", &png)),
        save(&service, "schedules", data_url("png", &png))
    );

    for tier in VariantTier::ALL {
        assert_ne!(athletes.get(tier), schedules.get(tier));
        assert!(athletes.get(tier).starts_with("/images/athletes/"));
        assert!(schedules.get(tier).starts_with("/images/schedules/"));
    }
    assert_eq!(count_files(&config.storage_root().join("athletes")), 3);
    assert_eq!(count_files(&config.storage_root().join("schedules")), 3);
}

#[tokio::test]
async fn test_malformed_input_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let service = ImageVariantService::new(&config).unwrap();

    for image in [
        "iVBORw0KGgoAAAANSUhEUg==",
        "data:image/png;base64,",
        "data:image/png;base64,%%%%",
        "data:image/svg+xml;base64,PHN2Zz4=",
    ] {
        let err = service
            .save_variants(SaveVariantsRequest {
                folder: "athletes".to_string(),
                image: image.to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_client_error(), "{:?} gave {}", image, err);
    }

    assert!(!config.storage_root().exists());
}

#[tokio::test]
async fn test_corrupt_image_is_internal_error_without_files() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let service = ImageVariantService::new(&config).unwrap();

    let err = service
        .save_variants(SaveVariantsRequest {
            folder: "athletes".to_string(),
            image: data_url("png", b"definitely not a png"),
        })
        .await
        .unwrap_err();

    assert!(!err.is_client_error());
    assert_eq!(count_files(&config.storage_root()), 0);
}

#[tokio::test]
async fn test_failed_tier_write_rolls_back_other_tiers() {
    let storage = MockStorage::new().with_failing_tier(VariantTier::Large);
    let service = ImageVariantService::with_storage(
        Arc::new(storage.clone()),
        Config::DEFAULT_MAX_PAYLOAD_BYTES,
    );

    let png = create_test_image(20, 20, ImageFormat::Png);
    let result = service
        .save_variants(SaveVariantsRequest {
            folder: "athletes".to_string(),
            image: data_url("png", &png),
        })
        .await;

    assert!(result.is_err());
    assert!(storage.get_files().is_empty());
}

#[tokio::test]
async fn test_unwritable_root_surfaces_storage_error_and_rolls_back() {
    let dir = TempDir::new().unwrap();
    // A regular file where the `large` tier directory must go.
    let root = dir.path().join("images");
    std::fs::create_dir_all(root.join("athletes")).unwrap();
    std::fs::write(root.join("athletes/large"), b"blocker").unwrap();

    let storage = LocalStorage::new(&root, "/images");
    let service =
        ImageVariantService::with_storage(Arc::new(storage), Config::DEFAULT_MAX_PAYLOAD_BYTES);

    let png = create_test_image(20, 20, ImageFormat::Png);
    let err = service
        .save_variants(SaveVariantsRequest {
            folder: "athletes".to_string(),
            image: data_url("png", &png),
        })
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Storage error"));
    assert_eq!(count_files(&root.join("athletes/small")), 0);
    assert_eq!(count_files(&root.join("athletes/medium")), 0);
}

#[tokio::test]
async fn test_transform_resize_width_only() {
    let dir = TempDir::new().unwrap();
    let service = ImageVariantService::new(&test_config(&dir)).unwrap();

    let png = create_test_image(400, 100, ImageFormat::Png);
    let response = service
        .transform(TransformRequest {
            image: data_url("png", &png),
            operations: Some(TransformOperation {
                resize: Some(ResizeOperation {
                    width: Some(200),
                    height: None,
                }),
                format: Some("jpeg".to_string()),
            }),
        })
        .await
        .unwrap();

    let payload = response
        .image
        .strip_prefix("data:image/jpeg;base64,")
        .unwrap();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    let img = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
    assert_eq!((img.width(), img.height()), (200, 50));
}

#[tokio::test]
async fn test_transform_without_operations_keeps_dimensions() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let service = ImageVariantService::new(&config).unwrap();

    let png = create_test_image(33, 17, ImageFormat::Png);
    let response = service
        .transform(TransformRequest {
            image: data_url("png", &png),
            operations: None,
        })
        .await
        .unwrap();

    let payload = response.image.strip_prefix("data:image/png;base64,").unwrap();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (33, 17));
    assert!(!config.storage_root().exists());
}
