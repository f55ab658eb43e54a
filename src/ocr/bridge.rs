use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::ocr::recognition::Recognition;
use crate::ocr::TextRecognizer;

static NEXT_IMAGE_ID: AtomicUsize = AtomicUsize::new(0);

/// Runs an external recognizer script that prints a [`Recognition`] as JSON.
///
/// The script is invoked as `<interpreter> <script> --image <png> --lang <lang>`.
#[derive(Debug, Clone)]
pub struct OcrBridge {
    work_dir: PathBuf,
    interpreter: PathBuf,
    script_path: PathBuf,
    lang: String,
}

impl OcrBridge {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            interpreter: PathBuf::from("python3"),
            script_path: PathBuf::from("ocr/bridge/ocr_bridge.py"),
            lang: "eng".to_string(),
        }
    }

    pub fn with_script(mut self, script_path: PathBuf) -> Self {
        self.script_path = script_path;
        self
    }

    pub fn with_interpreter(mut self, interpreter: PathBuf) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    pub fn run(&self, image_path: &Path) -> Result<Recognition> {
        let output = Command::new(&self.interpreter)
            .arg(&self.script_path)
            .arg("--image")
            .arg(image_path)
            .arg("--lang")
            .arg(&self.lang)
            .output()
            .with_context(|| {
                format!(
                    "failed to invoke OCR bridge {}",
                    self.script_path.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("OCR bridge failed ({}): {stderr}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let recognition: Recognition =
            serde_json::from_str(&stdout).with_context(|| "failed to parse OCR JSON response")?;
        Ok(recognition)
    }

    fn stage_image(&self, image: &DynamicImage) -> Result<PathBuf> {
        fs::create_dir_all(&self.work_dir).with_context(|| {
            format!("failed to create OCR work dir {}", self.work_dir.display())
        })?;
        let id = NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed);
        let path = self
            .work_dir
            .join(format!("ocr_{}_{id:04}.png", std::process::id()));
        image
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

impl TextRecognizer for OcrBridge {
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition> {
        let path = self.stage_image(image)?;
        debug!(image = %path.display(), "running OCR bridge");
        let result = self.run(&path);
        let _ = fs::remove_file(&path);
        result
    }
}
