//! Planar geometry for contour analysis
//!
//! Provides the minimum-area rotated bounding rectangle (convex hull +
//! rotating calipers) and the corner canonicalization feeding the
//! rectification step. `imageproc` traces contours but does not expose a
//! rotated bounding box, so the rectangle search lives here.
//!
//! Reference: Toussaint, "Solving Geometric Problems with the Rotating
//! Calipers".

use std::cmp::Ordering;

/// 2-D point with floating-point coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width/height pair of a rotated rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size2f {
    pub width: f32,
    pub height: f32,
}

/// Minimum-area bounding rectangle of a point set, possibly not axis-aligned
#[derive(Debug, Clone, Copy)]
pub struct RotatedRect {
    pub center: Point2f,
    pub size: Size2f,
    /// Base edge angle in degrees, measured from the positive x axis
    pub angle: f32,
}

impl RotatedRect {
    pub fn long_side(&self) -> f32 {
        self.size.width.max(self.size.height)
    }

    pub fn short_side(&self) -> f32 {
        self.size.width.min(self.size.height)
    }

    /// Long side over short side. Infinite for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> f32 {
        self.long_side() / self.short_side()
    }

    /// The four corner points, unordered winding.
    pub fn corner_points(&self) -> [Point2f; 4] {
        let theta = self.angle.to_radians();
        let (sin, cos) = theta.sin_cos();
        let hw = self.size.width / 2.0;
        let hh = self.size.height / 2.0;
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| Point2f {
            x: self.center.x + dx * cos - dy * sin,
            y: self.center.y + dx * sin + dy * cos,
        })
    }
}

/// Enclosed area of a closed polygon via the shoelace formula
pub fn polygon_area(points: &[Point2f]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f32;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area.abs() / 2.0
}

/// Minimum-area rotated bounding rectangle of a point set.
///
/// Collinear or near-empty inputs degrade to the axis-aligned bounding box.
pub fn min_area_rect(points: &[Point2f]) -> RotatedRect {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return bounding_rect(points);
    }
    calipers_min_rect(&hull)
}

/// Canonicalize four corners: sort by angle around the centroid, then rotate
/// the sequence so the corner with the smallest x + y sum comes first.
///
/// The heuristic is only validated for near-axis-aligned rectangles; for
/// strongly rotated quads the "top-left" anchor can land on a different
/// physical corner.
pub fn order_corners(corners: [Point2f; 4]) -> [Point2f; 4] {
    let cx = corners.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = corners.iter().map(|p| p.y).sum::<f32>() / 4.0;

    let mut ordered = corners;
    ordered.sort_by(|a, b| {
        let angle_a = (a.y - cy).atan2(a.x - cx);
        let angle_b = (b.y - cy).atan2(b.x - cx);
        angle_a.partial_cmp(&angle_b).unwrap_or(Ordering::Equal)
    });

    let first = ordered
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a.x + a.y)
                .partial_cmp(&(b.x + b.y))
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    ordered.rotate_left(first);
    ordered
}

/// Axis-aligned bounding box as a degenerate-input fallback
fn bounding_rect(points: &[Point2f]) -> RotatedRect {
    if points.is_empty() {
        return RotatedRect {
            center: Point2f::new(0.0, 0.0),
            size: Size2f {
                width: 0.0,
                height: 0.0,
            },
            angle: 0.0,
        };
    }
    let (min_x, max_x, min_y, max_y) = points.iter().fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |(min_x, max_x, min_y, max_y), p| {
            (
                min_x.min(p.x),
                max_x.max(p.x),
                min_y.min(p.y),
                max_y.max(p.y),
            )
        },
    );
    RotatedRect {
        center: Point2f::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
        size: Size2f {
            width: max_x - min_x,
            height: max_y - min_y,
        },
        angle: 0.0,
    }
}

/// Convex hull via Andrew's monotone chain
fn convex_hull(points: &[Point2f]) -> Vec<Point2f> {
    let mut pts: Vec<Point2f> = points.to_vec();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    pts.dedup();

    let mut hull: Vec<Point2f> = Vec::with_capacity(pts.len() * 2);
    // Lower hull, then upper hull over the reversed sweep.
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &Point2f>> = if pass == 0 {
            Box::new(pts.iter())
        } else {
            Box::new(pts.iter().rev())
        };
        for p in iter {
            while hull.len() >= start + 2
                && cross(hull[hull.len() - 2], hull[hull.len() - 1], *p) <= 0.0
            {
                hull.pop();
            }
            hull.push(*p);
        }
        // Last point repeats as the first of the next pass.
        hull.pop();
    }
    hull
}

/// Cross product of vectors OA and OB
fn cross(o: Point2f, a: Point2f, b: Point2f) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Rotating calipers over a convex hull
fn calipers_min_rect(hull: &[Point2f]) -> RotatedRect {
    let n = hull.len();
    let mut best_area = f32::MAX;
    let mut best = bounding_rect(hull);

    for i in 0..n {
        let p1 = hull[i];
        let p2 = hull[(i + 1) % n];
        let edge_x = p2.x - p1.x;
        let edge_y = p2.y - p1.y;
        let edge_len = edge_x.hypot(edge_y);
        if edge_len < 1e-10 {
            continue;
        }

        // Edge-aligned unit axes.
        let ux = edge_x / edge_len;
        let uy = edge_y / edge_len;
        let vx = -uy;
        let vy = ux;

        let mut min_u = f32::MAX;
        let mut max_u = f32::MIN;
        let mut min_v = f32::MAX;
        let mut max_v = f32::MIN;
        for p in hull {
            let dx = p.x - p1.x;
            let dy = p.y - p1.y;
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let width = max_u - min_u;
        let height = max_v - min_v;
        if width * height < best_area {
            best_area = width * height;
            let center_u = (min_u + max_u) / 2.0;
            let center_v = (min_v + max_v) / 2.0;
            best = RotatedRect {
                center: Point2f::new(
                    p1.x + center_u * ux + center_v * vx,
                    p1.y + center_u * uy + center_v * vy,
                ),
                size: Size2f { width, height },
                angle: uy.atan2(ux).to_degrees(),
            };
        }
    }

    best
}
