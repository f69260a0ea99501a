//! Frame time
//!
//! The counting core never reads a clock. Every frame carries a timestamp
//! captured by the caller, represented as integer microseconds so that
//! cooldown comparisons are exact (0.6s - 0.2s is exactly 0.4s).

use std::ops::{Add, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Frame time - microseconds since an arbitrary, per-caller epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameTime(pub i64);

impl FrameTime {
    pub const ZERO: FrameTime = FrameTime(0);

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        FrameTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        FrameTime(millis.saturating_mul(1000))
    }

    /// Rounds to the nearest microsecond.
    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        FrameTime((secs * 1_000_000.0).round() as i64)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn since(self, earlier: FrameTime) -> Duration {
        self - earlier
    }
}

#[inline]
fn duration_micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

// Time arithmetic saturates at the ends of the i64 range

impl Add<Duration> for FrameTime {
    type Output = FrameTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        FrameTime(self.0.saturating_add(duration_micros(rhs)))
    }
}

impl Sub<Duration> for FrameTime {
    type Output = FrameTime;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        FrameTime(self.0.saturating_sub(duration_micros(rhs)))
    }
}

impl Sub<FrameTime> for FrameTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: FrameTime) -> Self::Output {
        // The gap between any two i64 values fits in a u64
        let diff = i128::from(self.0) - i128::from(rhs.0);
        if diff > 0 {
            Duration::from_micros(diff as u64)
        } else {
            Duration::ZERO
        }
    }
}

impl std::fmt::Debug for FrameTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}s)", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_rounding_is_exact_at_boundaries() {
        let a = FrameTime::from_secs_f64(0.2);
        let b = FrameTime::from_secs_f64(0.6);
        assert_eq!(b - a, Duration::from_millis(400));
    }

    #[test]
    fn test_sub_saturates_at_zero() {
        let early = FrameTime::from_millis(100);
        let late = FrameTime::from_millis(300);
        assert_eq!(early - late, Duration::ZERO);
        assert_eq!(late.since(early), Duration::from_millis(200));
    }

    #[test]
    fn test_sub_across_the_whole_range() {
        let min = FrameTime::from_secs_f64(-1e300);
        let max = FrameTime::from_secs_f64(1e300);
        assert_eq!(min, FrameTime(i64::MIN));
        assert_eq!(max, FrameTime(i64::MAX));

        assert_eq!(max - min, Duration::from_micros(u64::MAX));
        assert_eq!(min - max, Duration::ZERO);
        assert_eq!(max - FrameTime::ZERO, Duration::from_micros(i64::MAX as u64));
    }

    #[test]
    fn test_duration_arithmetic_saturates() {
        let near_end = FrameTime(i64::MAX - 10);
        assert_eq!(near_end + Duration::from_secs(1), FrameTime(i64::MAX));
        assert_eq!(FrameTime(i64::MIN + 10) - Duration::from_secs(1), FrameTime(i64::MIN));
        assert_eq!(FrameTime::ZERO + Duration::MAX, FrameTime(i64::MAX));
        assert_eq!(FrameTime::from_millis(i64::MAX), FrameTime(i64::MAX));
    }

    #[test]
    fn test_add_duration() {
        let t = FrameTime::ZERO + Duration::from_millis(1500);
        assert_eq!(t.as_millis(), 1500);
        assert!((t.as_secs_f64() - 1.5).abs() < f64::EPSILON);
    }
}
