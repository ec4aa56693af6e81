//! Tesseract command-line adapter
//!
//! Writes the prepared crop to a temp file and runs the `tesseract` binary
//! with the configured language, whitelist and segmentation mode.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use image::GrayImage;
use tokio::process::Command;
use tracing::debug;

use crate::config::OcrSettings;
use crate::error::OcrError;

use super::OcrEngine;

static INVOCATION: AtomicU64 = AtomicU64::new(0);

/// OCR backend driving an external Tesseract executable
pub struct TesseractCli {
    binary: PathBuf,
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn temp_input_path() -> PathBuf {
        let seq = INVOCATION.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("platescan_ocr_{}_{}.png", std::process::id(), seq))
    }

    async fn run(&self, input: &Path, settings: &OcrSettings) -> Result<String, OcrError> {
        // Page segmentation 7 treats the image as a single text line.
        let psm = if settings.single_line { "7" } else { "3" };
        let output = Command::new(&self.binary)
            .arg(input)
            .arg("stdout")
            .args(["-l", &settings.language])
            .args(["--psm", psm])
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", settings.whitelist))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(OcrError::EngineSpawn)?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| OcrError::InvalidOutput)
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image: &GrayImage, settings: &OcrSettings) -> Result<String, OcrError> {
        let input = Self::temp_input_path();
        image.save(&input)?;

        let result = self.run(&input, settings).await;
        let _ = std::fs::remove_file(&input);

        if let Ok(text) = &result {
            debug!(len = text.len(), "tesseract output received");
        }
        result
    }
}
