//! Edge-based contour extraction
//!
//! Blur, Canny and a single dilation pass turn the frame into a clean edge
//! map; the outer contours of that map are the plate candidates.

use image::{GrayImage, Rgba, RgbaImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use tracing::debug;

use crate::config::DetectionSettings;
use crate::vision::geometry::Point2f;

/// Extract outer contours from a grayscale frame.
///
/// No size filtering happens here; that is the scorer's job.
pub fn extract_outer_contours(gray: &GrayImage, settings: &DetectionSettings) -> Vec<Contour<i32>> {
    let blurred = gaussian_blur_f32(gray, settings.blur_sigma);
    let edges = canny(&blurred, settings.canny_low, settings.canny_high);
    // One dilation pass bridges hairline gaps in the plate border.
    let dilated = dilate(&edges, Norm::LInf, 1);

    let contours: Vec<Contour<i32>> = find_contours(&dilated);
    let outer: Vec<Contour<i32>> = contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .collect();
    debug!(count = outer.len(), "outer contours extracted");
    outer
}

/// Contour trace as floating-point points
pub fn contour_points(contour: &Contour<i32>) -> Vec<Point2f> {
    contour
        .points
        .iter()
        .map(|p| Point2f::new(p.x as f32, p.y as f32))
        .collect()
}

/// Diagnostic overlay: paint every contour trace onto a copy of the frame
pub fn draw_contour_overlay(frame: &RgbaImage, contours: &[Contour<i32>]) -> RgbaImage {
    let mut overlay = frame.clone();
    let color = Rgba([0, 255, 0, 255]);
    for contour in contours {
        for p in &contour.points {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < overlay.width() && (p.y as u32) < overlay.height()
            {
                overlay.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
    }
    overlay
}
