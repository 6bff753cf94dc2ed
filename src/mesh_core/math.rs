//! Geometric predicates and constructions.
//!
//! All sign decisions (orientation, in-circle) are delegated to the adaptive
//! exact predicates of the `robust` crate and are therefore consistent even
//! for nearly degenerate input. Derived quantities such as circumcenters and
//! angles are computed in plain floating point; their error only affects mesh
//! quality, never validity.

use crate::{CoordinateError, MeshNum, Point2};

use super::LineSideInfo;

/// The smallest allowed non-zero coordinate magnitude, equal to 2<sup>-142</sup>.
///
/// Coordinates closer to zero (but not zero itself) can make the exact
/// predicates underflow. Derived from Shewchuk's exponent range analysis for
/// IEEE-754 double precision.
pub const MIN_ALLOWED_VALUE: f64 = 1.793662034335766e-43; // 1.0 * 2^-142

/// The largest allowed coordinate magnitude, equal to 2<sup>201</sup>.
pub const MAX_ALLOWED_VALUE: f64 = 3.2138760885179806e60; // 1.0 * 2^201

/// Checks that a coordinate is finite and within the range supported by the
/// exact predicates.
pub fn validate_coordinate<S: MeshNum>(value: S) -> Result<(), CoordinateError> {
    let as_f64: f64 = value.into();
    if as_f64.is_nan() {
        Err(CoordinateError::Nan)
    } else if as_f64.abs() < MIN_ALLOWED_VALUE && as_f64 != 0.0 {
        Err(CoordinateError::TooSmall)
    } else if as_f64.abs() > MAX_ALLOWED_VALUE {
        Err(CoordinateError::TooLarge)
    } else {
        Ok(())
    }
}

/// Checks both coordinates of a point, see [validate_coordinate].
pub fn validate_point<S: MeshNum>(point: Point2<S>) -> Result<(), CoordinateError> {
    validate_coordinate(point.x)?;
    validate_coordinate(point.y)?;
    Ok(())
}

fn to_robust_coord<S: MeshNum>(point: Point2<S>) -> robust::Coord<S> {
    robust::Coord {
        x: point.x,
        y: point.y,
    }
}

/// Exact orientation test: on which side of the directed line `p1 -> p2`
/// does `query_point` lie?
///
/// The underlying determinant is twice the signed area of the triangle
/// `(p1, p2, query_point)` - positive for a counter clockwise turn.
pub fn side_query<S: MeshNum>(p1: Point2<S>, p2: Point2<S>, query_point: Point2<S>) -> LineSideInfo {
    let p1 = to_robust_coord(p1);
    let p2 = to_robust_coord(p2);
    let query_point = to_robust_coord(query_point);

    let result = robust::orient2d(p1, p2, query_point);
    LineSideInfo::from_determinant(result)
}

/// Exact lifted determinant of the in-circle test.
///
/// `v1`, `v2`, `v3` must be ordered counter clockwise. The result is positive
/// if `p` lies strictly inside the circle through the three points, negative
/// strictly outside, and exactly zero if all four points are co-circular.
pub fn circumference_determinant<S: MeshNum>(
    v1: Point2<S>,
    v2: Point2<S>,
    v3: Point2<S>,
    p: Point2<S>,
) -> f64 {
    let v1 = to_robust_coord(v1);
    let v2 = to_robust_coord(v2);
    let v3 = to_robust_coord(v3);
    let p = to_robust_coord(p);

    // incircle expects clockwise vertex order for right handed systems,
    // hence the reversal.
    -robust::incircle(v3, v2, v1, p)
}

/// Returns `true` if `p` lies strictly inside the circle through `v1`, `v2`
/// and `v3` (ordered counter clockwise).
///
/// Co-circular configurations count as *outside* so that legalization never
/// cycles on ties.
pub fn contained_in_circumference<S: MeshNum>(
    v1: Point2<S>,
    v2: Point2<S>,
    v3: Point2<S>,
    p: Point2<S>,
) -> bool {
    circumference_determinant(v1, v2, v3, p) > 0.0
}

/// The circumcenter of the triangle `positions` together with the squared
/// circumradius.
///
/// Solves the 2x2 system formed by the perpendicular bisectors of two
/// triangle edges. The triangle must not be exactly collinear.
pub fn circumcenter(positions: [Point2<f64>; 3]) -> (Point2<f64>, f64) {
    let [v0, v1, v2] = positions;
    let b = v1.sub(v0);
    let c = v2.sub(v0);

    let d = 2.0 * (b.x * c.y - c.x * b.y);
    let len_b = b.dot(b);
    let len_c = c.dot(c);
    let d_inv = 1.0 / d;

    let x = (len_b * c.y - len_c * b.y) * d_inv;
    let y = (-len_b * c.x + len_c * b.x) * d_inv;
    (Point2::new(x, y).add(v0), x * x + y * y)
}

/// The (unsigned) area of the triangle `positions`.
pub fn triangle_area(positions: [Point2<f64>; 3]) -> f64 {
    let [v0, v1, v2] = positions;
    let b = v1.sub(v0);
    let c = v2.sub(v0);
    (b.x * c.y - b.y * c.x).abs() * 0.5
}

/// Returns `true` if `query_point` lies strictly inside the diametral circle
/// of the segment `from` - `to`.
///
/// This is the encroachment test of Ruppert's algorithm: an encroached
/// constraint segment must be subdivided before a Steiner point may be placed
/// nearby.
pub fn is_encroaching(from: Point2<f64>, to: Point2<f64>, query_point: Point2<f64>) -> bool {
    let center = from.mid(to);
    let radius_2 = from.distance_2(to) * 0.25;

    query_point.distance_2(center) < radius_2
}

/// Quality statistics of a triangle: its smallest interior angle (degrees)
/// and its circumradius to shortest edge ratio.
///
/// The ratio relates to the smallest angle by `ratio = 1 / (2 sin(min_angle))`;
/// the refinement loop ranks faces by the ratio, the angle is reported for
/// diagnostics and tests.
pub fn triangle_statistics(positions: [Point2<f64>; 3]) -> (f64, f64) {
    let [v0, v1, v2] = positions;

    let mut min_angle = f64::MAX;
    for (a, b, c) in [(v0, v1, v2), (v1, v2, v0), (v2, v0, v1)] {
        let u = b.sub(a);
        let v = c.sub(a);
        let angle = (u.x * v.y - u.y * v.x).atan2(u.dot(v)).abs();
        if angle < min_angle {
            min_angle = angle;
        }
    }

    let shortest_2 = [
        v0.distance_2(v1),
        v1.distance_2(v2),
        v2.distance_2(v0),
    ]
    .into_iter()
    .fold(f64::MAX, f64::min);

    let (_, radius_2) = circumcenter(positions);
    let ratio = (radius_2 / shortest_2).sqrt();

    (min_angle.to_degrees(), ratio)
}
