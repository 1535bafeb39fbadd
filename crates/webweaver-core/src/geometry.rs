//! Stateless geometry kernel: distances, interpolation and parabolic thread sag.

use crate::Position;

/// Gravity constant feeding [`sag_magnitude`].
pub const GRAVITY: f32 = 0.3;
/// Global scale applied on top of gravity when deriving sag.
pub const SAG_SCALE: f32 = 0.3;
/// Fraction of gravity removed at full tension; a taut thread keeps the remaining 10%.
pub const TENSION_RELIEF: f32 = 0.9;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(p: Position, q: Position) -> f32 {
    (q.x - p.x).hypot(q.y - p.y)
}

/// Linear interpolation between `from` and `to`.
#[must_use]
pub fn lerp(from: Position, to: Position, t: f32) -> Position {
    Position::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
}

/// Point at parameter `t` along a thread sagging by `sag_amount` at its midpoint.
///
/// The displacement is `4·sag·t·(1−t)` along +y (screen down), so both
/// endpoints are returned exactly and the midpoint drops by exactly `sag_amount`.
/// Thread drawing and spider placement both go through this function.
#[must_use]
pub fn sag_point(from: Position, to: Position, t: f32, sag_amount: f32) -> Position {
    if t <= 0.0 {
        return from;
    }
    if t >= 1.0 {
        return to;
    }
    let base = lerp(from, to, t);
    Position::new(base.x, base.y + 4.0 * sag_amount * t * (1.0 - t))
}

/// Sag depth for a thread of `length` under the given `tension` in `[0, 1]`.
#[must_use]
pub fn sag_magnitude(length: f32, tension: f32) -> f32 {
    length * GRAVITY * (1.0 - tension * TENSION_RELIEF) * SAG_SCALE
}

/// Arithmetic mean of `points`; the origin when empty.
#[must_use]
pub fn centroid(points: &[Position]) -> Position {
    if points.is_empty() {
        return Position::default();
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0_f64, 0.0_f64), |(sx, sy), p| {
            (sx + f64::from(p.x), sy + f64::from(p.y))
        });
    let n = points.len() as f64;
    Position::new((sx / n) as f32, (sy / n) as f32)
}

/// Polar angle of `point` around `origin` in `(-π, π]`.
#[must_use]
pub fn polar_angle(origin: Position, point: Position) -> f32 {
    (point.y - origin.y).atan2(point.x - origin.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sag_point_hits_endpoints_exactly() {
        let from = Position::new(3.5, -2.0);
        let to = Position::new(120.25, 48.0);
        for sag in [0.0, 1.0, 17.5, -4.0, 1.0e6] {
            assert_eq!(sag_point(from, to, 0.0, sag), from);
            assert_eq!(sag_point(from, to, 1.0, sag), to);
        }
    }

    #[test]
    fn sag_point_midpoint_drops_by_sag() {
        let from = Position::new(0.0, 0.0);
        let to = Position::new(100.0, 40.0);
        let sag = 12.0;
        let mid = sag_point(from, to, 0.5, sag);
        let straight = lerp(from, to, 0.5);
        assert_eq!(mid.x, straight.x);
        assert!((mid.y - straight.y - sag).abs() < 1e-5);
    }

    #[test]
    fn sag_is_symmetric_about_midpoint() {
        let from = Position::new(0.0, 0.0);
        let to = Position::new(10.0, 0.0);
        let a = sag_point(from, to, 0.25, 4.0);
        let b = sag_point(from, to, 0.75, 4.0);
        assert!((a.y - b.y).abs() < 1e-6);
        assert!((a.y - 3.0).abs() < 1e-6);
    }

    #[test]
    fn tension_reduces_but_never_removes_sag() {
        let slack = sag_magnitude(100.0, 0.0);
        let taut = sag_magnitude(100.0, 1.0);
        assert!(slack > taut);
        assert!(taut > 0.0);
        assert!((taut / slack - 0.1).abs() < 1e-5);
        assert_eq!(sag_magnitude(0.0, 0.5), 0.0);
    }

    #[test]
    fn centroid_and_angle() {
        let points = [
            Position::new(0.0, 0.0),
            Position::new(100.0, 0.0),
            Position::new(50.0, 100.0),
        ];
        let c = centroid(&points);
        assert!((c.x - 50.0).abs() < 1e-4);
        assert!((c.y - 100.0 / 3.0).abs() < 1e-4);
        assert_eq!(centroid(&[]), Position::default());
        let right = polar_angle(Position::new(0.0, 0.0), Position::new(1.0, 0.0));
        assert_eq!(right, 0.0);
        assert!((distance(points[0], points[1]) - 100.0).abs() < f32::EPSILON);
    }
}
