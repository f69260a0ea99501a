//! Joint geometry
//!
//! Two measurements drive every exercise: the interior angle at a joint
//! vertex, and the spread between two joints relative to a calibration
//! length. The unchecked forms pass degenerate input straight through; the
//! checked forms report it as `None` so callers can treat the sample as low
//! confidence.

use repcount_core::JointPoint;

/// Shoulder separation, in normalized image units, that maps to a spread
/// ratio of 1.0
pub const DEFAULT_SPREAD_CALIBRATION: f32 = 0.3;

/// Rays shorter than this are treated as coincident points
pub const MIN_RAY_LENGTH: f32 = 1e-6;

/// Interior angle at `b` formed by rays b→a and b→c, in degrees [0, 180]
pub fn angle_between(a: JointPoint, b: JointPoint, c: JointPoint) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();

    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// `angle_between`, or `None` when the triple is degenerate
pub fn checked_angle(a: JointPoint, b: JointPoint, c: JointPoint) -> Option<f32> {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return None;
    }
    if b.distance(&a) < MIN_RAY_LENGTH || b.distance(&c) < MIN_RAY_LENGTH {
        return None;
    }

    let angle = angle_between(a, b, c);
    angle.is_finite().then_some(angle)
}

/// Distance between two joints divided by a calibration length
pub fn spread_ratio(p: JointPoint, q: JointPoint, calibration: f32) -> f32 {
    p.distance(&q) / calibration
}

/// `spread_ratio`, or `None` for non-finite input or a non-positive calibration
pub fn checked_spread_ratio(p: JointPoint, q: JointPoint, calibration: f32) -> Option<f32> {
    if !(p.is_finite() && q.is_finite()) || !calibration.is_finite() || calibration <= 0.0 {
        return None;
    }

    let ratio = spread_ratio(p, q, calibration);
    ratio.is_finite().then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> JointPoint {
        JointPoint::new(x, y)
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_between(pt(1.0, 0.0), pt(0.0, 0.0), pt(0.0, 1.0));
        assert!((angle - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_straight_limb() {
        let angle = angle_between(pt(0.5, 0.9), pt(0.5, 0.6), pt(0.5, 0.3));
        assert!((angle - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_reflex_difference_is_folded() {
        // Rays at +170 and -170 degrees: raw difference 340, interior 20
        let a = pt(170f32.to_radians().cos(), 170f32.to_radians().sin());
        let c = pt((-170f32).to_radians().cos(), (-170f32).to_radians().sin());
        let angle = angle_between(a, pt(0.0, 0.0), c);
        assert!((angle - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_argument_order_is_symmetric() {
        let (a, b, c) = (pt(0.2, 0.1), pt(0.4, 0.5), pt(0.9, 0.4));
        assert!((angle_between(a, b, c) - angle_between(c, b, a)).abs() < 1e-4);
    }

    #[test]
    fn test_coincident_points_pass_through_unchecked() {
        let p = pt(0.5, 0.5);
        assert_eq!(angle_between(p, p, p), 0.0);
        assert_eq!(checked_angle(p, p, pt(0.9, 0.9)), None);
    }

    #[test]
    fn test_non_finite_is_degenerate() {
        assert_eq!(checked_angle(pt(f32::NAN, 0.0), pt(0.0, 0.0), pt(1.0, 1.0)), None);
        assert_eq!(checked_spread_ratio(pt(0.0, f32::INFINITY), pt(0.0, 0.0), 0.3), None);
    }

    #[test]
    fn test_spread_ratio() {
        let ratio = spread_ratio(pt(0.2, 0.5), pt(0.8, 0.5), DEFAULT_SPREAD_CALIBRATION);
        assert!((ratio - 2.0).abs() < 1e-5);
        assert_eq!(checked_spread_ratio(pt(0.2, 0.5), pt(0.8, 0.5), 0.0), None);
    }
}
