//! Built-in codec backed by the `image` and `ravif` crates.
//!
//! | Format | Encoder                         | Quality aware |
//! |--------|---------------------------------|---------------|
//! | AVIF   | `ravif` (rav1e)                 | yes           |
//! | JPEG   | `image::codecs::jpeg`           | yes           |
//! | WebP   | `image::codecs::webp` lossless  | no            |
//! | PNG    | `image::codecs::png`            | no            |

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use ravif::{Img, RGBA8};

use super::codec::{Codec, CodecError, Dimensions, EncodeSettings, ImageFormat};

/// Codec implemented with pure Rust crates, no system libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    pub const fn new() -> Self {
        Self
    }
}

impl Codec for ImageCodec {
    type Image = DynamicImage;

    fn probe(&self, bytes: &[u8]) -> Result<Dimensions, CodecError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Unreadable(e.to_string()))?
            .into_dimensions()
            .map_err(|e| CodecError::Unreadable(e.to_string()))?;

        if width == 0 || height == 0 {
            return Err(CodecError::Unreadable(format!("empty image {width}x{height}")));
        }
        Ok(Dimensions::new(width, height))
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        image::load_from_memory(bytes).map_err(|e| CodecError::Unreadable(e.to_string()))
    }

    fn resize(&self, image: &DynamicImage, to: Dimensions) -> Result<DynamicImage, CodecError> {
        if to.width == 0 || to.height == 0 {
            return Err(CodecError::Resize(to, "zero-sized target".to_string()));
        }
        Ok(image.resize_exact(to.width, to.height, FilterType::Lanczos3))
    }

    fn encode(&self, image: &DynamicImage, settings: EncodeSettings) -> Result<Vec<u8>, CodecError> {
        let encode_err = |reason: String| CodecError::Encode {
            format: settings.format,
            reason,
        };

        let bytes = match settings.format {
            ImageFormat::Avif => encode_avif(image, settings).map_err(encode_err)?,
            ImageFormat::Jpeg => {
                let mut buf = Vec::new();
                let encoder = JpegEncoder::new_with_quality(&mut buf, settings.quality.clamp(1, 100));
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_err(e.to_string()))?;
                buf
            }
            ImageFormat::Webp => {
                let mut buf = Vec::new();
                DynamicImage::ImageRgba8(image.to_rgba8())
                    .write_with_encoder(WebPEncoder::new_lossless(&mut buf))
                    .map_err(|e| encode_err(e.to_string()))?;
                buf
            }
            ImageFormat::Png => {
                let mut buf = Vec::new();
                image
                    .write_with_encoder(PngEncoder::new(&mut buf))
                    .map_err(|e| encode_err(e.to_string()))?;
                buf
            }
        };

        if bytes.is_empty() {
            return Err(encode_err("empty output".to_string()));
        }
        Ok(bytes)
    }

    fn quality_sensitive(&self, format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Avif | ImageFormat::Jpeg)
    }
}

/// Encode to AVIF with rav1e.
///
/// Effort 0..=9 maps onto ravif speed 10..=1.
fn encode_avif(image: &DynamicImage, settings: EncodeSettings) -> Result<Vec<u8>, String> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels: Vec<RGBA8> = rgba
        .pixels()
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();

    let quality = f32::from(settings.quality.clamp(1, 100));
    let encoded = ravif::Encoder::new()
        .with_quality(quality)
        .with_alpha_quality(quality)
        .with_speed(avif_speed(settings.effort))
        .encode_rgba(Img::new(pixels.as_slice(), width as usize, height as usize))
        .map_err(|e| e.to_string())?;

    Ok(encoded.avif_file)
}

#[inline]
const fn avif_speed(effort: u8) -> u8 {
    let effort = if effort > 9 { 9 } else { effort };
    10 - effort
}
