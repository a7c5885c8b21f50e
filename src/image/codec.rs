use crate::Result;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

pub const JPEG_QUALITY: u8 = 80;
const AVIF_QUALITY: u8 = 80;
const AVIF_SPEED: u8 = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageCodec {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl ImageCodec {
    /// Resolve a MIME subtype or transform format name (`jpg` is accepted as jpeg).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(ImageCodec::Jpeg),
            "png" => Some(ImageCodec::Png),
            "webp" => Some(ImageCodec::WebP),
            "avif" => Some(ImageCodec::Avif),
            _ => None,
        }
    }

    /// Whether this build can decode inputs of this codec. AVIF decoding
    /// needs the `avif-decode` feature.
    pub fn can_decode(self) -> bool {
        match self {
            ImageCodec::Avif => cfg!(feature = "avif-decode"),
            _ => true,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageCodec::Jpeg => "image/jpeg",
            ImageCodec::Png => "image/png",
            ImageCodec::WebP => "image/webp",
            ImageCodec::Avif => "image/avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageCodec::Jpeg => "jpg",
            ImageCodec::Png => "png",
            ImageCodec::WebP => "webp",
            ImageCodec::Avif => "avif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            ImageCodec::Jpeg => ImageFormat::Jpeg,
            ImageCodec::Png => ImageFormat::Png,
            ImageCodec::WebP => ImageFormat::WebP,
            ImageCodec::Avif => ImageFormat::Avif,
        }
    }
}

/// Decode `data` as `codec`, without sniffing the bytes for another format.
pub fn load(data: &[u8], codec: ImageCodec) -> Result<DynamicImage> {
    Ok(image::load_from_memory_with_format(data, codec.image_format())?)
}

/// Encode `img` with `codec`. JPEG drops alpha and uses [`JPEG_QUALITY`].
pub fn encode(img: &DynamicImage, codec: ImageCodec) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(img.width() as usize * img.height() as usize * 3);

    match codec {
        ImageCodec::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))?;
        }
        ImageCodec::Png => {
            img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        }
        ImageCodec::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut Cursor::new(&mut buffer), ImageFormat::WebP)?;
        }
        ImageCodec::Avif => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(AvifEncoder::new_with_speed_quality(
                &mut buffer,
                AVIF_SPEED,
                AVIF_QUALITY,
            ))?;
        }
    }

    Ok(buffer)
}
