//! Nearest-segment search along a route polyline.
//!
//! The snap position is the clamped planar projection of the observer onto
//! each segment in lng/lat degree space; distances between positions are
//! haversine meters. Street segments are tens of meters long, so the
//! planar projection error stays far below positioning noise while every
//! reported distance remains geodesic.

use geo::line_measures::Distance;
use geo::{Coord, Haversine, Point};

/// The observer snapped onto one route segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentSnap {
    /// Index of the segment from vertex `index` to vertex `index + 1`.
    pub index: usize,
    /// Snapped position on the segment, lng/lat.
    pub position: Point<f64>,
    /// Haversine distance from the observer to `position`, in meters.
    pub distance_m: f64,
}

/// Nearest point on the segment `start..end` to `observer`.
///
/// Projects onto the infinite line through the segment and clamps the
/// projection parameter to the segment; a projection falling outside the
/// segment therefore resolves to the nearer endpoint. A zero-length
/// segment resolves to `start`.
pub(crate) fn nearest_on_segment(
    observer: Point<f64>,
    start: Coord<f64>,
    end: Coord<f64>,
) -> Point<f64> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq == 0.0 {
        return Point::from(start);
    }

    let t = ((observer.x() - start.x) * dx + (observer.y() - start.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);
    Point::new(t.mul_add(dx, start.x), t.mul_add(dy, start.y))
}

/// Closest segment of `vertices` to the observer.
///
/// Ties break toward the first occurrence in polyline order. Returns
/// `None` when the polyline has fewer than two vertices.
pub(crate) fn nearest_segment(
    observer: Point<f64>,
    vertices: &[Coord<f64>],
) -> Option<SegmentSnap> {
    let mut best: Option<SegmentSnap> = None;

    for (index, pair) in vertices.windows(2).enumerate() {
        let position = nearest_on_segment(observer, pair[0], pair[1]);
        let distance_m = Haversine.distance(observer, position);
        if best.is_none_or(|b| distance_m < b.distance_m) {
            best = Some(SegmentSnap {
                index,
                position,
                distance_m,
            });
        }
    }

    best
}
