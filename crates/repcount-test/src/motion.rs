//! Synthetic exercise motion
//!
//! Builds keypoint frames whose tracked metric takes an exact value, and
//! scripts of timed frames that sweep a profile between its two reference
//! positions like a person doing repetitions.

use std::f64::consts::PI;
use std::time::Duration;

use repcount_core::{FrameTime, Joint, Keypoint, KeypointLayout, PoseFrame};
use repcount_engine::{Direction, ExerciseProfile, Metric};

/// Limb length used when placing joints, normalized image units
const LIMB: f32 = 0.2;

/// Where the body is drawn in the image
const CENTER: (f32, f32) = (0.5, 0.5);

/// Confidence stamped on generated keypoints
pub const GENERATED_CONFIDENCE: f32 = 0.95;

/// A frame in which `metric` measures `value`
///
/// Angles are clamped to (0, 180) so the target is reachable by an
/// interior angle.
pub fn frame_for_value(metric: &Metric, layout: KeypointLayout, value: f32) -> PoseFrame {
    let mut frame = PoseFrame::blank(layout);
    let mut place = |joint: Joint, x: f32, y: f32| {
        frame.set_joint(joint, Keypoint::with_confidence(x, y, GENERATED_CONFIDENCE));
    };

    match *metric {
        Metric::JointAngle { first, vertex, last } => {
            let theta = value.clamp(0.5, 179.5).to_radians();
            let (cx, cy) = CENTER;
            place(vertex, cx, cy);
            // First ray points straight up in image space
            place(first, cx, cy - LIMB);
            place(last, cx + LIMB * theta.sin(), cy - LIMB * theta.cos());
        }
        Metric::Spread {
            from,
            to,
            calibration,
        } => {
            let half = value.max(0.0) * calibration / 2.0;
            let (cx, cy) = CENTER;
            place(from, cx - half, cy);
            place(to, cx + half, cy);
        }
    }

    frame
}

/// Target value comfortably past the extended threshold
pub fn extended_target(profile: &ExerciseProfile) -> f32 {
    clamp_for(profile, past(profile, profile.extended_threshold, true))
}

/// Target value comfortably past the flexed threshold
pub fn flexed_target(profile: &ExerciseProfile) -> f32 {
    clamp_for(profile, past(profile, profile.flexed_threshold, false))
}

fn past(profile: &ExerciseProfile, threshold: f32, extended: bool) -> f32 {
    let margin = (profile.extended_threshold - profile.flexed_threshold).abs() * 0.25;
    // Extended lies above the band for descending metrics, below for ascending
    let upward = matches!(
        (profile.direction, extended),
        (Direction::Descending, true) | (Direction::Ascending, false)
    );
    if upward {
        threshold + margin
    } else {
        threshold - margin
    }
}

fn clamp_for(profile: &ExerciseProfile, value: f32) -> f32 {
    match profile.metric {
        Metric::JointAngle { .. } => value.clamp(1.0, 179.0),
        Metric::Spread { .. } => value.max(0.0),
    }
}

/// A scripted set of repetitions
#[derive(Clone, Debug)]
pub struct MotionScript {
    pub layout: KeypointLayout,
    /// Frames per second
    pub fps: u32,
    /// Duration of one extended → flexed → extended cycle
    pub period: Duration,
    pub reps: u32,
    /// Time of the first frame
    pub start: FrameTime,
}

impl Default for MotionScript {
    fn default() -> Self {
        MotionScript {
            layout: KeypointLayout::MediaPipe33,
            fps: 30,
            period: Duration::from_millis(1500),
            reps: 5,
            start: FrameTime::ZERO,
        }
    }
}

impl MotionScript {
    pub fn reps(reps: u32) -> Self {
        MotionScript {
            reps,
            ..Default::default()
        }
    }

    pub fn with_layout(mut self, layout: KeypointLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Metric values over time, a cosine sweep starting and ending extended
    pub fn values(&self, profile: &ExerciseProfile) -> Vec<(FrameTime, f32)> {
        let high = extended_target(profile) as f64;
        let low = flexed_target(profile) as f64;
        let mid = (high + low) / 2.0;
        let amp = (high - low) / 2.0;

        let fps = self.fps.max(1) as f64;
        let period = self.period.as_secs_f64().max(1.0 / fps);
        let total = (self.reps as f64 * period * fps).round() as u64;

        (0..=total)
            .map(|k| {
                let secs = k as f64 / fps;
                let phase = 2.0 * PI * secs / period;
                let t = self.start + Duration::from_secs_f64(secs);
                (t, (mid + amp * phase.cos()) as f32)
            })
            .collect()
    }

    /// Timed frames for `profile`
    pub fn frames(&self, profile: &ExerciseProfile) -> Vec<(FrameTime, PoseFrame)> {
        self.values(profile)
            .into_iter()
            .map(|(t, v)| (t, frame_for_value(&profile.metric, self.layout, v)))
            .collect()
    }
}
