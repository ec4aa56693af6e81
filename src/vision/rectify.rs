//! Perspective rectification and character-zone cropping
//!
//! Maps the selected quadrilateral onto an axis-aligned plate image via a
//! four-point projection, then cuts out the character-bearing center strip
//! with fixed margin ratios.

use image::imageops;
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::debug;

use crate::config::CropSettings;
use crate::error::CycleError;
use crate::vision::geometry::{order_corners, Point2f, RotatedRect};

/// Source quadrilateral with the rectified output dimensions
#[derive(Debug, Clone)]
pub struct PlateRegion {
    /// Corners in canonical winding, top-left first
    pub corners: [Point2f; 4],
    /// Rectified plate width in pixels
    pub width: u32,
    /// Rectified plate height in pixels
    pub height: u32,
}

/// Derive the rectification target from a candidate rectangle.
///
/// The width is the rectangle's long side. The measured short side is
/// unreliable for skewed plates, so the height comes from the fixed plate
/// proportions instead of the measurement.
pub fn plate_region(rect: &RotatedRect, aspect_prior: f32) -> PlateRegion {
    let corners = order_corners(rect.corner_points());
    let width = rect.long_side().round().max(1.0) as u32;
    let height = (width as f32 / aspect_prior).round().max(1.0) as u32;
    PlateRegion {
        corners,
        width,
        height,
    }
}

/// Warp the full frame so the plate region fills an axis-aligned rectangle.
///
/// A degenerate quadrilateral (coincident corners, zero area) has no
/// projection; that is a per-cycle failure, not a fatal one.
pub fn rectify(frame: &RgbaImage, region: &PlateRegion) -> Result<RgbaImage, CycleError> {
    let src = region.corners.map(|p| (p.x, p.y));
    let dst = [
        (0.0, 0.0),
        (region.width as f32 - 1.0, 0.0),
        (region.width as f32 - 1.0, region.height as f32 - 1.0),
        (0.0, region.height as f32 - 1.0),
    ];
    let projection =
        Projection::from_control_points(src, dst).ok_or(CycleError::DegenerateGeometry)?;

    let mut output = RgbaImage::new(region.width, region.height);
    warp_into(
        frame,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 255]),
        &mut output,
    );
    debug!(width = region.width, height = region.height, "plate rectified");
    Ok(output)
}

/// Character-zone rectangle (x, y, width, height) for a rectified plate
pub fn character_zone(width: u32, height: u32, crop: &CropSettings) -> (u32, u32, u32, u32) {
    let x = (width as f32 * crop.left_margin_ratio).round() as u32;
    let y = (height as f32 * crop.top_margin_ratio).round() as u32;
    let w = (width as f32 * crop.width_ratio).round() as u32;
    let h = (height as f32 * crop.height_ratio).round() as u32;
    let w = w.min(width.saturating_sub(x)).max(1);
    let h = h.min(height.saturating_sub(y)).max(1);
    (x, y, w, h)
}

/// Extract the character zone from a rectified plate image
pub fn crop_character_zone(plate: &RgbaImage, zone: (u32, u32, u32, u32)) -> RgbaImage {
    let (x, y, w, h) = zone;
    imageops::crop_imm(plate, x, y, w, h).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::geometry::Size2f;

    #[test]
    fn test_character_zone_ratios() {
        let crop = CropSettings::default();
        assert_eq!(character_zone(300, 100, &crop), (15, 25, 270, 65));
    }

    #[test]
    fn test_character_zone_stays_in_bounds() {
        let crop = CropSettings::default();
        for (w, h) in [(10, 4), (55, 18), (301, 101)] {
            let (x, y, cw, ch) = character_zone(w, h, &crop);
            assert!(x + cw <= w, "{w}x{h}");
            assert!(y + ch <= h, "{w}x{h}");
        }
    }

    #[test]
    fn test_plate_region_forces_aspect() {
        let rect = RotatedRect {
            center: Point2f::new(100.0, 100.0),
            size: Size2f {
                width: 240.0,
                height: 110.0,
            },
            angle: 0.0,
        };
        let region = plate_region(&rect, 3.0);
        assert_eq!(region.width, 240);
        // Height is derived from the prior, not the measured 110.
        assert_eq!(region.height, 80);
    }

    #[test]
    fn test_rectify_axis_aligned_rect() {
        let mut frame = RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255]));
        for y in 100..200 {
            for x in 50..350 {
                frame.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let rect = RotatedRect {
            center: Point2f::new(200.0, 150.0),
            size: Size2f {
                width: 300.0,
                height: 100.0,
            },
            angle: 0.0,
        };
        let region = plate_region(&rect, 3.0);
        let plate = rectify(&frame, &region).unwrap();
        assert_eq!(plate.dimensions(), (300, 100));
        // Center of the rectified plate lands inside the white area.
        assert_eq!(plate.get_pixel(150, 50).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_rectify_degenerate_corners() {
        let frame = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let p = Point2f::new(10.0, 10.0);
        let region = PlateRegion {
            corners: [p, p, p, p],
            width: 30,
            height: 10,
        };
        match rectify(&frame, &region) {
            Err(CycleError::DegenerateGeometry) => {}
            other => panic!("expected degenerate geometry, got {other:?}"),
        }
    }

    #[test]
    fn test_crop_character_zone_dimensions() {
        let plate = RgbaImage::from_pixel(300, 100, Rgba([200, 200, 200, 255]));
        let zone = character_zone(300, 100, &CropSettings::default());
        let cropped = crop_character_zone(&plate, zone);
        assert_eq!(cropped.dimensions(), (270, 65));
    }
}
