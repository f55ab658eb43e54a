pub mod bridge;
pub mod recognition;

pub use bridge::OcrBridge;
pub use recognition::{Recognition, TextBlock, TextElement, TextLine};

use anyhow::Result;
use image::DynamicImage;

/// External text-recognition engine: positioned text for one image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition>;
}
