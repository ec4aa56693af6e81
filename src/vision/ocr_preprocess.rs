//! Character-zone preparation for OCR
//!
//! Binarizes and upscales the cropped character strip so the OCR engine
//! sees high-contrast, well-connected glyphs. The processed image is also
//! the artifact exported at the end of a session.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbaImage};
use imageproc::contrast::{equalize_histogram, otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use tracing::debug;

use crate::config::OcrPreprocessSettings;

/// Grayscale, equalize, binarize (Otsu), upscale and close the crop.
pub fn prepare_for_ocr(crop: &RgbaImage, settings: &OcrPreprocessSettings) -> GrayImage {
    let gray = DynamicImage::ImageRgba8(crop.clone()).to_luma8();
    let blurred = gaussian_blur_f32(&gray, settings.blur_sigma);
    let contrasted = if settings.equalize {
        equalize_histogram(&blurred)
    } else {
        blurred
    };

    let level = otsu_level(&contrasted);
    let binary = threshold(&contrasted, level, ThresholdType::Binary);
    debug!(otsu = level, "character zone binarized");

    let scaled = if settings.upscale > 1 {
        imageops::resize(
            &binary,
            binary.width() * settings.upscale,
            binary.height() * settings.upscale,
            FilterType::CatmullRom,
        )
    } else {
        binary
    };

    if settings.morph_close {
        // Closing reconnects character strokes broken by thresholding.
        close(&scaled, Norm::LInf, 1)
    } else {
        scaled
    }
}
