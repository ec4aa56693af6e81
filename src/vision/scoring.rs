//! Candidate scoring and selection
//!
//! Each contour is scored against two plate priors: the expected aspect
//! ratio and a minimum useful area. A single linear scan keeps the best
//! candidate above the acceptance threshold.

use imageproc::contours::Contour;
use tracing::trace;

use crate::config::DetectionSettings;
use crate::vision::contours::contour_points;
use crate::vision::geometry::{min_area_rect, polygon_area, RotatedRect};

/// A contour that survived the area gate, with its bounding rectangle and score
#[derive(Debug, Clone)]
pub struct Candidate {
    pub rect: RotatedRect,
    pub area: f32,
    /// Blended shape score in [0, 1]
    pub score: f32,
}

/// How close the aspect ratio is to the plate prior, linear falloff
pub fn aspect_score(aspect_ratio: f32, settings: &DetectionSettings) -> f32 {
    (1.0 - (aspect_ratio - settings.aspect_prior).abs() / settings.aspect_tolerance).max(0.0)
}

/// Area contribution, saturating at the normalization constant
pub fn area_score(area: f32, settings: &DetectionSettings) -> f32 {
    (area / settings.area_norm).min(1.0)
}

/// Weighted blend of the two shape priors
pub fn score_rect(rect: &RotatedRect, area: f32, settings: &DetectionSettings) -> f32 {
    settings.aspect_weight * aspect_score(rect.aspect_ratio(), settings)
        + settings.area_weight * area_score(area, settings)
}

/// Pick the best candidate above the acceptance threshold, or none.
///
/// Contours below the minimum area are discarded before scoring. The strict
/// comparison keeps the first of equally scored candidates.
pub fn select_best(contours: &[Contour<i32>], settings: &DetectionSettings) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for contour in contours {
        let points = contour_points(contour);
        if points.len() < 3 {
            continue;
        }
        let area = polygon_area(&points);
        if area < settings.min_contour_area {
            continue;
        }
        let rect = min_area_rect(&points);
        let score = score_rect(&rect, area, settings);
        trace!(area, score, "candidate scored");
        if score <= settings.score_threshold {
            continue;
        }
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Candidate { rect, area, score });
        }
    }
    best
}
