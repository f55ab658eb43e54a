//! Source image normalization ahead of recognition.

use anyhow::{Context, Result};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::core::config::ImageSettings;
use crate::core::model::{CaptureSource, SourceImage};

/// Image handed to the splitter: re-encoded PNG, or the untouched upload
/// when preprocessing failed.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub source: CaptureSource,
    /// False when the original bytes were passed through unchanged.
    pub normalized: bool,
}

impl PreparedImage {
    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory(&self.bytes).context("failed to decode prepared image")
    }
}

pub fn target_width(source: CaptureSource, settings: &ImageSettings) -> u32 {
    match source {
        CaptureSource::Camera => settings.camera_width,
        CaptureSource::File => settings.file_width,
    }
}

/// Resize to the capture source's target width and re-encode losslessly.
///
/// Never fails: on any decode or encode error the original bytes come back.
pub fn preprocess(image: &SourceImage, settings: &ImageSettings) -> PreparedImage {
    let width = target_width(image.source, settings);
    match normalize(&image.bytes, width) {
        Ok(bytes) => {
            debug!(source = %image.source, width, bytes = bytes.len(), "image normalized");
            PreparedImage {
                bytes,
                source: image.source,
                normalized: true,
            }
        }
        Err(err) => {
            warn!(source = %image.source, "preprocessing failed, using original image: {err:#}");
            PreparedImage {
                bytes: image.bytes.clone(),
                source: image.source,
                normalized: false,
            }
        }
    }
}

fn normalize(bytes: &[u8], width: u32) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes).context("failed to decode source image")?;
    let resized = resize_to_width(&decoded, width);
    encode_png(&resized)
}

/// Downscale to `width`, keeping the aspect ratio. Narrower images are kept as is.
pub fn resize_to_width(image: &DynamicImage, width: u32) -> DynamicImage {
    if width == 0 || image.width() <= width {
        return image.clone();
    }
    let height = (u64::from(image.height()) * u64::from(width) / u64::from(image.width())).max(1);
    image.resize_exact(width, height as u32, FilterType::Lanczos3)
}

/// Lossless PNG at maximum compression.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
    image
        .write_with_encoder(encoder)
        .context("failed to encode PNG")?;
    Ok(buf)
}
