//! Repetition state machine
//!
//! ```text
//!   Detecting ──past extended──▶ Extended ──past flexed, cooldown ok──▶ Flexed (+1)
//!                                   ▲                                     │
//!                                   └──────────past extended──────────────┘
//! ```
//!
//! A session that starts mid-motion must pass through Extended before its
//! first count, so a partial rep at session start is never counted. A
//! flexed crossing inside the cooldown leaves the stage at Extended; it is
//! counted on a later frame if the limb is still flexed once the cooldown
//! has elapsed.

use std::sync::Arc;

use repcount_core::FrameTime;
use repcount_signal::SmoothingWindow;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{ExerciseKind, ExerciseProfile, Measurement};

/// Limb position classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No reference position reached yet
    #[default]
    Detecting,
    /// At rest / extended position
    Extended,
    /// At active / flexed position
    Flexed,
}

/// Coarse form signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureState {
    /// At one of the two extremes
    Good,
    /// Between the thresholds, movement in progress
    Borderline,
    /// No trustworthy measurement yet
    #[default]
    Unknown,
}

/// Outcome of feeding one value through the machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub rep_completed: bool,
    pub stage: Stage,
    pub posture: PostureState,
    /// Smoothed value the decision was made on
    pub value: f32,
}

/// Outcome of feeding one frame measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// A value was smoothed and the transition function applied
    Advanced(Transition),
    /// Geometry was undefined; posture downgraded, nothing else touched
    Degenerate,
    /// No usable pose; the machine did not move
    Skipped(Measurement),
}

impl Observation {
    pub fn pose_detected(&self) -> bool {
        !matches!(self, Observation::Skipped(_))
    }

    pub fn rep_completed(&self) -> bool {
        matches!(
            self,
            Observation::Advanced(Transition {
                rep_completed: true,
                ..
            })
        )
    }
}

/// Per-client counting state
#[derive(Debug, Clone)]
pub struct RepSession {
    profile: Arc<ExerciseProfile>,
    count: u32,
    stage: Stage,
    posture: PostureState,
    last_rep_time: Option<FrameTime>,
    last_value: Option<f32>,
    window: SmoothingWindow,
}

impl RepSession {
    /// Create a session with a smoothing window of `smoothing` samples
    pub fn new(profile: Arc<ExerciseProfile>, smoothing: usize) -> Self {
        RepSession {
            profile,
            count: 0,
            stage: Stage::Detecting,
            posture: PostureState::Unknown,
            last_rep_time: None,
            last_value: None,
            window: SmoothingWindow::new(smoothing),
        }
    }

    /// Apply one raw value at time `now`
    pub fn advance(&mut self, raw_value: f32, now: FrameTime) -> Transition {
        let value = self.window.push_and_smooth(raw_value);
        self.last_value = Some(value);

        let mut rep_completed = false;

        if self.profile.is_past_extended(value) {
            if self.stage != Stage::Extended {
                trace!(kind = %self.profile.kind, value, from = ?self.stage, "stage -> extended");
            }
            self.stage = Stage::Extended;
            self.posture = PostureState::Good;
        } else if self.stage == Stage::Extended && self.profile.is_past_flexed(value) {
            self.posture = PostureState::Good;

            if self.cooldown_elapsed(now) {
                self.stage = Stage::Flexed;
                self.count += 1;
                self.last_rep_time = Some(now);
                rep_completed = true;
                debug!(kind = %self.profile.kind, count = self.count, value, ?now, "repetition counted");
            } else {
                trace!(kind = %self.profile.kind, value, ?now, "flexed inside cooldown, not counted");
            }
        } else if self.profile.is_in_band(value) {
            self.posture = PostureState::Borderline;
        }

        Transition {
            rep_completed,
            stage: self.stage,
            posture: self.posture,
            value,
        }
    }

    /// Apply one frame measurement
    pub fn observe(&mut self, measurement: Measurement, now: FrameTime) -> Observation {
        match measurement {
            Measurement::Value(v) if v.is_finite() => Observation::Advanced(self.advance(v, now)),
            Measurement::Value(_) | Measurement::Degenerate => {
                self.posture = PostureState::Unknown;
                Observation::Degenerate
            }
            skipped => Observation::Skipped(skipped),
        }
    }

    /// Zero the count and forget all history; the exercise is kept
    pub fn reset(&mut self) {
        self.count = 0;
        self.stage = Stage::Detecting;
        self.posture = PostureState::Unknown;
        self.last_rep_time = None;
        self.last_value = None;
        self.window.clear();
    }

    fn cooldown_elapsed(&self, now: FrameTime) -> bool {
        match self.last_rep_time {
            None => true,
            Some(last) => now - last >= self.profile.min_rep_interval,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// User-facing word for the current stage
    pub fn stage_label(&self) -> &str {
        match self.stage {
            Stage::Detecting => "detecting",
            Stage::Extended => &self.profile.extended_label,
            Stage::Flexed => &self.profile.flexed_label,
        }
    }

    pub fn posture(&self) -> PostureState {
        self.posture
    }

    pub fn last_rep_time(&self) -> Option<FrameTime> {
        self.last_rep_time
    }

    /// Last smoothed value
    pub fn last_value(&self) -> Option<f32> {
        self.last_value
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    pub fn profile(&self) -> &Arc<ExerciseProfile> {
        &self.profile
    }

    pub fn kind(&self) -> ExerciseKind {
        self.profile.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, ProfileTable};
    use proptest::prelude::*;
    use std::time::Duration;

    fn squat() -> Arc<ExerciseProfile> {
        Arc::new(ExerciseProfile::standard(ExerciseKind::Squat))
    }

    fn secs(s: f64) -> FrameTime {
        FrameTime::from_secs_f64(s)
    }

    /// A value comfortably past the extended threshold
    fn extended_value(p: &ExerciseProfile) -> f32 {
        let margin = (p.extended_threshold - p.flexed_threshold).abs() * 0.25;
        match p.direction {
            Direction::Descending => p.extended_threshold + margin,
            Direction::Ascending => p.extended_threshold - margin,
        }
    }

    /// A value comfortably past the flexed threshold
    fn flexed_value(p: &ExerciseProfile) -> f32 {
        let margin = (p.extended_threshold - p.flexed_threshold).abs() * 0.25;
        match p.direction {
            Direction::Descending => p.flexed_threshold - margin,
            Direction::Ascending => p.flexed_threshold + margin,
        }
    }

    #[test]
    fn test_squat_trace_unsmoothed() {
        let mut session = RepSession::new(squat(), 1);
        let angles = [170.0, 172.0, 80.0, 78.0, 165.0, 82.0];
        let times = [0.0, 0.1, 0.2, 0.3, 0.9, 1.0];

        let trace: Vec<(Stage, bool)> = angles
            .iter()
            .zip(times)
            .map(|(&a, t)| {
                let tr = session.advance(a, secs(t));
                (tr.stage, tr.rep_completed)
            })
            .collect();

        assert_eq!(
            trace,
            vec![
                (Stage::Extended, false),
                (Stage::Extended, false),
                (Stage::Flexed, true),
                (Stage::Flexed, false),
                (Stage::Extended, false),
                (Stage::Flexed, true),
            ]
        );
        assert_eq!(session.count(), 2);
    }

    #[test]
    fn test_curl_cooldown_boundary_is_inclusive() {
        let curl = ExerciseProfile::standard(ExerciseKind::BicepCurl)
            .with_min_rep_interval(Duration::from_millis(400));
        let mut session = RepSession::new(Arc::new(curl), 1);

        assert!(!session.advance(165.0, secs(0.0)).rep_completed);
        assert!(session.advance(45.0, secs(0.2)).rep_completed);
        assert_eq!(session.count(), 1);
        assert_eq!(session.stage_label(), "up");

        assert!(!session.advance(170.0, secs(0.4)).rep_completed);
        assert_eq!(session.stage_label(), "down");

        let last = session.advance(48.0, secs(0.6));
        assert!(last.rep_completed);
        assert_eq!(session.count(), 2);
    }

    #[test]
    fn test_flexed_inside_cooldown_is_not_counted() {
        let mut session = RepSession::new(squat(), 1);
        session.advance(170.0, secs(0.0));
        assert!(session.advance(80.0, secs(0.1)).rep_completed);
        session.advance(170.0, secs(0.2));

        let blocked = session.advance(80.0, secs(0.3));
        assert!(!blocked.rep_completed);
        assert_eq!(blocked.stage, Stage::Extended);
        assert_eq!(blocked.posture, PostureState::Good);
        assert_eq!(session.count(), 1);

        // Still flexed once the cooldown has passed
        let later = session.advance(80.0, secs(0.6));
        assert!(later.rep_completed);
        assert_eq!(session.count(), 2);
    }

    #[test]
    fn test_start_mid_motion_needs_full_cycle() {
        let mut session = RepSession::new(squat(), 1);
        assert!(!session.advance(80.0, secs(0.0)).rep_completed);
        assert_eq!(session.stage(), Stage::Detecting);
        assert_eq!(session.stage_label(), "detecting");

        session.advance(170.0, secs(1.0));
        assert!(session.advance(80.0, secs(2.0)).rep_completed);
    }

    #[test]
    fn test_borderline_band() {
        let mut session = RepSession::new(squat(), 1);
        let t = session.advance(120.0, secs(0.0));
        assert_eq!(t.posture, PostureState::Borderline);
        assert_eq!(t.stage, Stage::Detecting);

        session.advance(170.0, secs(0.1));
        let t = session.advance(120.0, secs(0.2));
        assert_eq!(t.posture, PostureState::Borderline);
        assert_eq!(t.stage, Stage::Extended);
    }

    #[test]
    fn test_smoothing_delays_crossing() {
        let mut session = RepSession::new(squat(), 3);
        session.advance(170.0, secs(0.0));
        session.advance(170.0, secs(0.1));
        // Mean of 170, 170, 20 is 120: not yet flexed
        let t = session.advance(20.0, secs(0.2));
        assert!(!t.rep_completed);
        assert!((t.value - 120.0).abs() < 1e-4);
        // Mean of 170, 20, 20 is 70
        assert!(session.advance(20.0, secs(0.3)).rep_completed);
    }

    #[test]
    fn test_jumping_jack_uses_ratio_thresholds() {
        let table = ProfileTable::standard();
        let jj = table.profile_for(ExerciseKind::JumpingJack).unwrap();
        let mut session = RepSession::new(jj, 1);

        session.advance(1.0, secs(0.0));
        assert_eq!(session.stage_label(), "down");
        assert!(session.advance(2.0, secs(0.5)).rep_completed);
        assert_eq!(session.stage_label(), "up");
    }

    #[test]
    fn test_skipped_measurements_leave_state_untouched() {
        let mut session = RepSession::new(squat(), 3);
        session.advance(170.0, secs(0.0));
        let before: Vec<f32> = session.window().samples().collect();

        for m in [
            Measurement::MissingPose,
            Measurement::MissingJoint(repcount_core::Joint::LeftHip),
            Measurement::LowConfidence(repcount_core::Joint::LeftKnee),
        ] {
            let obs = session.observe(m, secs(0.1));
            assert!(!obs.pose_detected());
            assert_eq!(obs, Observation::Skipped(m));
        }

        assert_eq!(session.window().samples().collect::<Vec<_>>(), before);
        assert_eq!(session.stage(), Stage::Extended);
        assert_eq!(session.posture(), PostureState::Good);
    }

    #[test]
    fn test_degenerate_downgrades_posture_only() {
        let mut session = RepSession::new(squat(), 3);
        session.advance(170.0, secs(0.0));

        let obs = session.observe(Measurement::Degenerate, secs(0.1));
        assert_eq!(obs, Observation::Degenerate);
        assert!(obs.pose_detected());
        assert_eq!(session.posture(), PostureState::Unknown);
        assert_eq!(session.stage(), Stage::Extended);
        assert_eq!(session.window().len(), 1);

        assert_eq!(
            session.observe(Measurement::Value(f32::NAN), secs(0.2)),
            Observation::Degenerate
        );
        assert_eq!(session.window().len(), 1);
    }

    #[test]
    fn test_reset() {
        let mut session = RepSession::new(squat(), 3);
        session.advance(170.0, secs(0.0));
        session.advance(10.0, secs(0.1));
        session.advance(10.0, secs(0.2));
        assert_eq!(session.count(), 1);

        session.reset();
        assert_eq!(session.count(), 0);
        assert_eq!(session.stage(), Stage::Detecting);
        assert_eq!(session.posture(), PostureState::Unknown);
        assert!(session.window().is_empty());
        assert_eq!(session.last_rep_time(), None);
        assert_eq!(session.kind(), ExerciseKind::Squat);
    }

    #[test]
    fn test_timestamps_at_the_ends_of_the_range() {
        let mut session = RepSession::new(squat(), 1);
        let earliest = secs(-1e300);
        let latest = secs(1e300);

        session.advance(170.0, earliest);
        assert!(session.advance(80.0, earliest).rep_completed);
        session.advance(170.0, earliest);
        assert!(session.advance(80.0, latest).rep_completed);
        assert_eq!(session.count(), 2);
        assert_eq!(session.last_rep_time(), Some(latest));
    }

    #[test]
    fn test_two_cycles_count_two_for_every_profile() {
        let table = ProfileTable::standard();
        for profile in table.iter() {
            let mut session = RepSession::new(Arc::clone(profile), 1);
            let gap = profile.min_rep_interval;
            let mut now = FrameTime::ZERO;

            for value in [
                extended_value(profile),
                flexed_value(profile),
                extended_value(profile),
                flexed_value(profile),
            ] {
                session.advance(value, now);
                now = now + gap;
            }

            assert_eq!(session.count(), 2, "{}", profile.kind);
        }
    }

    proptest! {
        #[test]
        fn prop_count_is_monotonic(
            angles in prop::collection::vec(0.0f32..180.0, 1..120),
            step_ms in 1i64..400,
        ) {
            let mut session = RepSession::new(squat(), 3);
            let mut prev = 0;
            for (i, a) in angles.into_iter().enumerate() {
                session.advance(a, FrameTime::from_millis(i as i64 * step_ms));
                prop_assert!(session.count() >= prev);
                prop_assert!(session.window().len() <= 3);
                prev = session.count();
            }
        }

        #[test]
        fn prop_never_extended_never_counts(
            angles in prop::collection::vec(0.0f32..=160.0, 1..120),
        ) {
            let mut session = RepSession::new(squat(), 2);
            for (i, a) in angles.into_iter().enumerate() {
                session.advance(a, FrameTime::from_millis(i as i64 * 100));
            }
            prop_assert_eq!(session.count(), 0);
            prop_assert_eq!(session.stage(), Stage::Detecting);
        }

        #[test]
        fn prop_counts_are_spaced_by_cooldown(
            angles in prop::collection::vec(prop_oneof![Just(170.0f32), Just(60.0f32), 60.0f32..170.0], 1..200),
            step_ms in 10i64..200,
        ) {
            let profile = squat();
            let mut session = RepSession::new(Arc::clone(&profile), 1);
            let mut last_count_at: Option<FrameTime> = None;
            for (i, a) in angles.into_iter().enumerate() {
                let now = FrameTime::from_millis(i as i64 * step_ms);
                if session.advance(a, now).rep_completed {
                    if let Some(prev) = last_count_at {
                        prop_assert!(now - prev >= profile.min_rep_interval);
                    }
                    last_count_at = Some(now);
                }
            }
        }
    }
}
