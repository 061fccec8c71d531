//! Pure geometric helpers for drawing and hit-testing curves.
//!
//! Every function here is stateless. Curve distances are approximated by
//! sampling the curve at evenly spaced parameters, which trades precision for
//! speed: accuracy grows with the slice count, and
//! [`CURVE_HIT_SLICES`](crate::constants::CURVE_HIT_SLICES) is enough for
//! picking curves at normal zoom levels.

use crate::constants::END_TANGENT_SAMPLE;
use crate::types::{BezierCurve, Coordinate, Point};

/// Evaluates a cubic Bézier curve at parameter `t` in `[0, 1]`.
pub fn point_on_curve(curve: &BezierCurve, t: f32) -> Point {
    let p0 = Point::from(curve.start);
    let p1 = Point::from(curve.control1);
    let p2 = Point::from(curve.control2);
    let p3 = Point::from(curve.end);

    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;

    Point {
        x: a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        y: a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    }
}

/// Approximates the direction of a curve where it arrives at its end point.
///
/// Uses the vector from the point at `t = 0.99` to the end point instead of the
/// analytic derivative, which vanishes when the last control point coincides
/// with the end point.
///
/// # Returns
///
/// The angle in radians, as given by `atan2`.
pub fn tangent_angle_near_end(curve: &BezierCurve) -> f32 {
    let near_end = point_on_curve(curve, END_TANGENT_SAMPLE);
    let end = Point::from(curve.end);
    (end.y - near_end.y).atan2(end.x - near_end.x)
}

/// Calculates the distance from a point to a line segment.
///
/// Uses vector projection to find the closest point on the line segment.
/// A segment whose ends coincide is treated as a single point.
///
/// # Arguments
///
/// * `point` - The point to measure from
/// * `a` - Start of the line segment
/// * `b` - End of the line segment
pub fn distance_point_to_segment(point: Point, a: Point, b: Point) -> f32 {
    let (sx, sy) = (b.x - a.x, b.y - a.y);
    let (px, py) = (point.x - a.x, point.y - a.y);
    let length_sq = sx * sx + sy * sy;

    if length_sq == 0.0 {
        return point.distance(a);
    }

    // Project point onto line segment (clamped to segment endpoints)
    let t = ((px * sx + py * sy) / length_sq).clamp(0.0, 1.0);
    let projection = Point::new(a.x + sx * t, a.y + sy * t);

    point.distance(projection)
}

/// Approximate distance from `point` to `curve`.
///
/// Samples `slices + 1` evenly spaced points along the curve and returns the
/// smallest distance to any of them. This is an upper bound on the true
/// distance to the curve, not the exact value.
pub fn distance_point_to_curve(point: Point, curve: &BezierCurve, slices: usize) -> f32 {
    let slices = slices.max(1);
    let tick = 1.0 / slices as f32;
    (0..=slices)
        .map(|i| point.distance(point_on_curve(curve, i as f32 * tick)))
        .fold(f32::INFINITY, f32::min)
}

/// Index of the point closest to `origin`.
///
/// Ties resolve to the first minimal point in iteration order.
///
/// # Returns
///
/// `None` if `points` is empty.
pub fn nearest_index(points: &[Point], origin: Point) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, point) in points.iter().enumerate() {
        let distance = point.distance(origin);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Index of the curve closest to `origin`, using the sampled distance.
///
/// Ties resolve to the first curve in iteration order.
pub fn nearest_curve_index<'a>(
    curves: impl IntoIterator<Item = &'a BezierCurve>,
    origin: Point,
    slices: usize,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, curve) in curves.into_iter().enumerate() {
        let distance = distance_point_to_curve(origin, curve, slices);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Rounds `value` to the nearest multiple of `step`, with halves rounding up.
pub fn round_to_nearest(value: i32, step: i32) -> i32 {
    if step <= 1 {
        return value;
    }
    let remainder = value.rem_euclid(step);
    if remainder >= step / 2 {
        value.saturating_add(step - remainder)
    } else {
        value - remainder
    }
}

/// Snaps a free point onto the model grid.
pub fn snap_to_grid(point: Point, step: i32) -> Coordinate {
    let rounded = point.round();
    Coordinate::new(
        round_to_nearest(rounded.x, step),
        round_to_nearest(rounded.y, step),
    )
}

/// The two outer points of an arrowhead drawn at the end of `curve`.
pub fn arrow_head(curve: &BezierCurve, size: f32) -> [Point; 2] {
    let angle = tangent_angle_near_end(curve);
    let end = Point::from(curve.end);
    let wing = |spread: f32| {
        Point::new(
            end.x - size * (angle + spread).cos(),
            end.y - size * (angle + spread).sin(),
        )
    };
    [
        wing(-std::f32::consts::FRAC_PI_6),
        wing(std::f32::consts::FRAC_PI_6),
    ]
}

/// Where an edge label is placed: beside the curve's midpoint, perpendicular
/// to the direction the curve arrives in.
pub fn label_position(curve: &BezierCurve, offset: f32) -> Point {
    let angle = tangent_angle_near_end(curve);
    let middle = point_on_curve(curve, 0.5);
    Point::new(
        middle.x + offset * angle.sin(),
        middle.y - offset * angle.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn curve(points: [(i32, i32); 4]) -> BezierCurve {
        BezierCurve {
            start: Coordinate::new(points[0].0, points[0].1),
            control1: Coordinate::new(points[1].0, points[1].1),
            control2: Coordinate::new(points[2].0, points[2].1),
            end: Coordinate::new(points[3].0, points[3].1),
        }
    }

    #[test]
    fn test_curve_endpoints() {
        let c = curve([(0, 0), (10, 50), (90, 50), (100, 0)]);
        assert_eq!(point_on_curve(&c, 0.0), Point::new(0.0, 0.0));
        assert_eq!(point_on_curve(&c, 1.0), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_curve_midpoint_of_symmetric_curve() {
        let c = curve([(0, 0), (0, 100), (100, 100), (100, 0)]);
        let mid = point_on_curve(&c, 0.5);
        assert!((mid.x - 50.0).abs() < 1e-4);
        assert!((mid.y - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_tangent_of_straight_curve() {
        let c = curve([(0, 0), (0, 0), (100, 0), (100, 0)]);
        assert!(tangent_angle_near_end(&c).abs() < 1e-4);

        let down = curve([(0, 0), (0, 0), (0, 100), (0, 100)]);
        let angle = tangent_angle_near_end(&down);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_distance_to_segment_projects_inside() {
        let d = distance_point_to_segment(
            Point::new(50.0, 10.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((d - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_distance_to_segment_clamps_to_endpoint() {
        let d = distance_point_to_segment(
            Point::new(103.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_distance_to_curve_hits_sampled_point() {
        let c = curve([(0, 0), (0, 0), (100, 0), (100, 0)]);
        assert_eq!(distance_point_to_curve(Point::new(0.0, 0.0), &c, 10), 0.0);
        assert!(distance_point_to_curve(Point::new(50.0, 20.0), &c, 10) <= 20.0 + 5.0);
    }

    #[test]
    fn test_distance_to_curve_with_zero_slices() {
        let c = curve([(0, 0), (0, 0), (100, 0), (100, 0)]);
        assert_eq!(distance_point_to_curve(Point::new(100.0, 0.0), &c, 0), 0.0);
    }

    #[test]
    fn test_nearest_index_breaks_ties_by_first() {
        let points = [
            Point::new(10.0, 0.0),
            Point::new(-10.0, 0.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(nearest_index(&points, Point::new(0.0, 0.0)), Some(0));
        assert_eq!(nearest_index(&points, Point::new(-9.0, 0.0)), Some(1));
        assert_eq!(nearest_index(&[], Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_nearest_curve_index() {
        let curves = [
            curve([(0, 0), (0, 0), (100, 0), (100, 0)]),
            curve([(0, 200), (0, 200), (100, 200), (100, 200)]),
        ];
        assert_eq!(
            nearest_curve_index(&curves, Point::new(50.0, 180.0), 10),
            Some(1)
        );
        assert_eq!(
            nearest_curve_index(std::iter::empty(), Point::new(0.0, 0.0), 10),
            None
        );
    }

    #[test]
    fn test_round_to_nearest() {
        assert_eq!(round_to_nearest(124, 50), 100);
        assert_eq!(round_to_nearest(125, 50), 150);
        assert_eq!(round_to_nearest(-30, 50), -50);
        assert_eq!(round_to_nearest(-20, 50), 0);
        assert_eq!(round_to_nearest(7, 1), 7);
        assert_eq!(round_to_nearest(i32::MAX - 1, 50), i32::MAX);
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(
            snap_to_grid(Point::new(112.4, 87.6), 50),
            Coordinate::new(100, 100)
        );
    }

    #[test]
    fn test_label_sits_above_rightward_edge() {
        let c = curve([(0, 0), (0, 0), (100, 0), (100, 0)]);
        let label = label_position(&c, 50.0);
        assert!((label.x - 50.0).abs() < 1e-3);
        assert!((label.y + 50.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_degenerate_segment_is_point_distance(
            px in -1000i32..1000, py in -1000i32..1000,
            ax in -1000i32..1000, ay in -1000i32..1000,
        ) {
            let p = Point::from(Coordinate::new(px, py));
            let a = Point::from(Coordinate::new(ax, ay));
            prop_assert_eq!(distance_point_to_segment(p, a, a), p.distance(a));
        }

        #[test]
        fn prop_nearest_index_is_first_minimum(
            raw in prop::collection::vec((-50i32..50, -50i32..50), 1..20),
            ox in -50i32..50, oy in -50i32..50,
        ) {
            let points: Vec<Point> = raw
                .iter()
                .map(|&(x, y)| Point::from(Coordinate::new(x, y)))
                .collect();
            let origin = Point::from(Coordinate::new(ox, oy));
            let index = nearest_index(&points, origin).unwrap();
            let best = points[index].distance(origin);
            for (i, p) in points.iter().enumerate() {
                let d = p.distance(origin);
                prop_assert!(d >= best);
                if i < index {
                    prop_assert!(d > best);
                }
            }
        }

        #[test]
        fn prop_curve_distance_never_below_zero_and_zero_at_ends(
            pts in prop::array::uniform4((-500i32..500, -500i32..500)),
        ) {
            let c = curve(pts);
            let start = Point::from(c.start);
            let end = Point::from(c.end);
            prop_assert_eq!(distance_point_to_curve(start, &c, 10), 0.0);
            prop_assert!(distance_point_to_curve(end, &c, 10) < 1e-2);
        }
    }
}
