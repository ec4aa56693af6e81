//! OCR engine boundary
//!
//! Text recognition itself is external; the session only depends on the
//! [`OcrEngine`] trait. The shipped backend shells out to a local Tesseract
//! installation.

pub mod normalize;
pub mod tesseract;

pub use tesseract::TesseractCli;

use async_trait::async_trait;
use image::GrayImage;

use crate::config::OcrSettings;
use crate::error::OcrError;

/// Asynchronous text recognition backend
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in a prepared character-zone image.
    ///
    /// Engine failures are recoverable per-cycle errors; the session surfaces
    /// them and offers a manual retry instead of retrying automatically.
    async fn recognize(&self, image: &GrayImage, settings: &OcrSettings) -> Result<String, OcrError>;
}
