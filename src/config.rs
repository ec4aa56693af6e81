//! Application Configuration
//!
//! Pipeline constants and user settings stored in TOML format. Every
//! heuristic the detector relies on (aspect prior, score weights, crop
//! ratios, timings) is a named setting rather than an embedded literal.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Detection settings
    pub detection: DetectionSettings,
    /// Character-zone crop settings
    pub crop: CropSettings,
    /// OCR settings
    pub ocr: OcrSettings,
    /// Session timing settings
    pub session: SessionSettings,
    /// Output settings
    pub output: OutputSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            detection: DetectionSettings::default(),
            crop: CropSettings::default(),
            ocr: OcrSettings::default(),
            session: SessionSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

/// Contour extraction and candidate scoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Gaussian blur sigma before edge detection
    pub blur_sigma: f32,
    /// Canny lower threshold
    pub canny_low: f32,
    /// Canny upper threshold
    pub canny_high: f32,
    /// Contours below this area (px²) are discarded before scoring
    pub min_contour_area: f32,
    /// Area at which the area score saturates at 1.0
    pub area_norm: f32,
    /// Expected plate width-to-height ratio
    pub aspect_prior: f32,
    /// Aspect deviation at which the aspect score reaches zero
    pub aspect_tolerance: f32,
    /// Weight of the aspect term in the blended score
    pub aspect_weight: f32,
    /// Weight of the area term in the blended score
    pub area_weight: f32,
    /// Candidates must score strictly above this to be accepted
    pub score_threshold: f32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            min_contour_area: 1000.0,
            area_norm: 10_000.0,
            aspect_prior: 3.0,
            aspect_tolerance: 2.0,
            aspect_weight: 0.7,
            area_weight: 0.3,
            score_threshold: 0.5,
        }
    }
}

/// Character-zone margins as fractions of the rectified plate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropSettings {
    /// Left margin, fraction of plate width
    pub left_margin_ratio: f32,
    /// Top margin, fraction of plate height
    pub top_margin_ratio: f32,
    /// Zone width, fraction of plate width
    pub width_ratio: f32,
    /// Zone height, fraction of plate height
    pub height_ratio: f32,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            left_margin_ratio: 0.05,
            top_margin_ratio: 0.25,
            width_ratio: 0.9,
            height_ratio: 0.65,
        }
    }
}

/// OCR engine and text normalization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Tesseract executable to invoke
    pub binary: PathBuf,
    /// Recognition language
    pub language: String,
    /// Characters the engine may emit
    pub whitelist: String,
    /// Treat the crop as a single text line
    pub single_line: bool,
    /// Decoration words removed from recognized text, longest first
    pub ignore_words: Vec<String>,
    /// Crop preparation before the engine call
    pub preprocess: OcrPreprocessSettings,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "por".to_string(),
            whitelist: "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string(),
            single_line: true,
            ignore_words: vec![
                "BRASIL".to_string(),
                "BR".to_string(),
                "MERCOSUL".to_string(),
            ],
            preprocess: OcrPreprocessSettings::default(),
        }
    }
}

/// Character-zone preparation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPreprocessSettings {
    /// Gaussian blur sigma before binarization
    pub blur_sigma: f32,
    /// Apply histogram equalization before Otsu
    pub equalize: bool,
    /// Integer upscale factor after binarization (1 = off)
    pub upscale: u32,
    /// Apply a morphological closing pass to reconnect strokes
    pub morph_close: bool,
}

impl Default for OcrPreprocessSettings {
    fn default() -> Self {
        Self {
            blur_sigma: 0.8,
            equalize: true,
            upscale: 2,
            morph_close: true,
        }
    }
}

/// Session timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Milliseconds between detection ticks while scanning
    pub tick_interval_ms: u64,
    /// Settle delay between locking a frame and starting OCR
    pub settle_delay_ms: u64,
    /// Give up after this many fruitless scan ticks (driver loop only)
    pub max_scan_ticks: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            settle_delay_ms: 100,
            max_scan_ticks: 20,
        }
    }
}

/// Artifact output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory for exported character-zone images (default: working dir)
    pub artifact_dir: Option<PathBuf>,
    /// Write the processed character zone to disk
    pub save_artifact: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            artifact_dir: None,
            save_artifact: true,
        }
    }
}

/// Default per-user configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "platescan").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
