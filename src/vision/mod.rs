//! Plate detection pipeline
//!
//! Turns a captured frame into a rectified plate image and its cropped
//! character zone: contour extraction, shape scoring, corner ordering,
//! perspective rectification and fixed-ratio cropping.

pub mod contours;
pub mod geometry;
pub mod ocr_preprocess;
pub mod rectify;
pub mod scoring;

pub use rectify::PlateRegion;
pub use scoring::Candidate;

use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::capture::Frame;
use crate::config::{CropSettings, DetectionSettings};
use crate::error::CycleError;

/// Everything a successful detection cycle produces
#[derive(Debug)]
pub struct Detection {
    /// Winning candidate with its score
    pub candidate: Candidate,
    /// Source quadrilateral and rectified dimensions
    pub region: PlateRegion,
    /// Full rectified plate image
    pub plate: RgbaImage,
    /// Character-zone rectangle within the rectified plate
    pub zone: (u32, u32, u32, u32),
    /// Cropped character-zone image
    pub char_zone: RgbaImage,
}

/// Runs the geometric half of the pipeline on single frames
pub struct PlateDetector {
    detection: DetectionSettings,
    crop: CropSettings,
}

impl PlateDetector {
    pub fn new(detection: DetectionSettings, crop: CropSettings) -> Self {
        Self { detection, crop }
    }

    /// Detect, rectify and crop the best plate candidate in a frame.
    pub fn detect(&self, frame: &Frame) -> Result<Detection, CycleError> {
        let rgba = frame.to_image().ok_or(CycleError::EmptyFrame)?;
        let gray = DynamicImage::ImageRgba8(rgba.clone()).to_luma8();

        let contours = contours::extract_outer_contours(&gray, &self.detection);
        let candidate =
            scoring::select_best(&contours, &self.detection).ok_or(CycleError::NoPlateFound)?;
        debug!(
            score = candidate.score,
            area = candidate.area,
            "plate candidate selected"
        );

        let region = rectify::plate_region(&candidate.rect, self.detection.aspect_prior);
        let plate = rectify::rectify(&rgba, &region)?;
        let zone = rectify::character_zone(region.width, region.height, &self.crop);
        let char_zone = rectify::crop_character_zone(&plate, zone);

        Ok(Detection {
            candidate,
            region,
            plate,
            zone,
            char_zone,
        })
    }

    /// Diagnostic image with all extracted contours painted on the frame.
    pub fn contour_overlay(&self, frame: &Frame) -> Option<RgbaImage> {
        let rgba = frame.to_image()?;
        let gray = DynamicImage::ImageRgba8(rgba.clone()).to_luma8();
        let contours = contours::extract_outer_contours(&gray, &self.detection);
        Some(contours::draw_contour_overlay(&rgba, &contours))
    }
}
