use super::{codec, decoder, ImageCodec};
use crate::models::{DecodedImage, ResizeOperation, TransformOperation};
use crate::{Error, Result};
use image::imageops::FilterType;
use tracing::{debug, warn};

/// Dimensions that fit `source` inside the requested box without upscaling.
///
/// An omitted bound leaves that axis unconstrained, so the other axis alone
/// decides the scale and aspect ratio is preserved.
pub fn fit_inside(source: (u32, u32), width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let scale_w = width.map(|w| w as f64 / src_w as f64);
    let scale_h = height.map(|h| h as f64 / src_h as f64);
    let scale = match (scale_w, scale_h) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return source,
    };

    if scale >= 1.0 {
        return source;
    }

    let w = ((src_w as f64 * scale).round() as u32).max(1);
    let h = ((src_h as f64 * scale).round() as u32).max(1);
    (w, h)
}

fn validate_resize(resize: &ResizeOperation) -> Result<()> {
    if resize.width == Some(0) || resize.height == Some(0) {
        return Err(Error::validation("resize dimensions must be greater than zero"));
    }
    Ok(())
}

/// Apply `ops` to `image` and return the result as a new embedded-data string.
///
/// Unknown format names are ignored and the source codec is kept.
pub fn transform(image: &DecodedImage, ops: &TransformOperation) -> Result<String> {
    if let Some(resize) = &ops.resize {
        validate_resize(resize)?;
    }

    let target = ops.format.as_deref().and_then(|name| {
        let codec = ImageCodec::from_name(name);
        if codec.is_none() {
            warn!(format = %name, "Ignoring unsupported output format");
        }
        codec
    });

    let mut img = codec::load(&image.data, image.codec)?;

    if let Some(resize) = &ops.resize {
        let source = (img.width(), img.height());
        let (w, h) = fit_inside(source, resize.width, resize.height);
        if (w, h) != source {
            debug!(from = ?source, to = ?(w, h), "Resizing image");
            img = img.resize_exact(w, h, FilterType::Lanczos3);
        }
    }

    let bytes = codec::encode(&img, target.unwrap_or(image.codec))?;
    let mime = match target {
        Some(codec) => codec.mime().to_string(),
        None => image.mime.clone(),
    };

    Ok(decoder::to_data_url(&mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn decoded_png(width: u32, height: u32) -> DecodedImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 90, 200])));
        DecodedImage {
            mime: "image/png".to_string(),
            codec: ImageCodec::Png,
            data: codec::encode(&img, ImageCodec::Png).unwrap(),
        }
    }

    fn dimensions_of(data_url: &str) -> (String, (u32, u32)) {
        let decoded = decoder::decode(data_url, usize::MAX).unwrap();
        let img = codec::load(&decoded.data, decoded.codec).unwrap();
        (decoded.mime, (img.width(), img.height()))
    }

    fn resize(width: Option<u32>, height: Option<u32>) -> TransformOperation {
        TransformOperation {
            resize: Some(ResizeOperation { width, height }),
            format: None,
        }
    }

    #[test]
    fn test_fit_inside_width_only() {
        assert_eq!(fit_inside((800, 600), Some(400), None), (400, 300));
        assert_eq!(fit_inside((600, 800), Some(300), None), (300, 400));
    }

    #[test]
    fn test_fit_inside_height_only() {
        assert_eq!(fit_inside((800, 600), None, Some(150)), (200, 150));
    }

    #[test]
    fn test_fit_inside_both_bounds_uses_tighter() {
        assert_eq!(fit_inside((800, 600), Some(400), Some(100)), (133, 100));
        assert_eq!(fit_inside((800, 600), Some(100), Some(400)), (100, 75));
    }

    #[test]
    fn test_fit_inside_never_upscales() {
        assert_eq!(fit_inside((100, 50), Some(400), None), (100, 50));
        assert_eq!(fit_inside((100, 50), Some(400), Some(400)), (100, 50));
        assert_eq!(fit_inside((100, 50), None, None), (100, 50));
    }

    #[test]
    fn test_fit_inside_keeps_one_pixel() {
        assert_eq!(fit_inside((1000, 10), Some(50), None), (50, 1));
    }

    #[test]
    fn test_transform_without_operations_keeps_dimensions() {
        let image = decoded_png(40, 30);
        let output = transform(&image, &TransformOperation::default()).unwrap();

        let (mime, dims) = dimensions_of(&output);
        assert_eq!(mime, "image/png");
        assert_eq!(dims, (40, 30));
    }

    #[test]
    fn test_transform_resize_width_preserves_aspect() {
        let image = decoded_png(120, 80);
        let output = transform(&image, &resize(Some(60), None)).unwrap();

        let (_, (w, h)) = dimensions_of(&output);
        assert!(w <= 60);
        assert_eq!((w, h), (60, 40));
    }

    #[test]
    fn test_transform_resize_does_not_enlarge() {
        let image = decoded_png(20, 10);
        let output = transform(&image, &resize(Some(200), Some(200))).unwrap();
        assert_eq!(dimensions_of(&output).1, (20, 10));
    }

    #[test]
    fn test_transform_converts_format() {
        let image = decoded_png(16, 16);
        let ops = TransformOperation {
            resize: None,
            format: Some("jpeg".to_string()),
        };
        let output = transform(&image, &ops).unwrap();

        assert!(output.starts_with("data:image/jpeg;base64,"));
        let (mime, dims) = dimensions_of(&output);
        assert_eq!(mime, "image/jpeg");
        assert_eq!(dims, (16, 16));
    }

    #[test]
    fn test_transform_ignores_unknown_format() {
        let image = decoded_png(16, 16);
        let ops = TransformOperation {
            resize: None,
            format: Some("bmp".to_string()),
        };
        let output = transform(&image, &ops).unwrap();
        assert!(output.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_transform_rejects_zero_dimension() {
        let image = decoded_png(16, 16);
        let err = transform(&image, &resize(Some(0), None)).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_transform_corrupt_data_is_codec_error() {
        let image = DecodedImage {
            mime: "image/png".to_string(),
            codec: ImageCodec::Png,
            data: vec![1, 2, 3, 4],
        };
        let err = transform(&image, &TransformOperation::default()).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }
}
