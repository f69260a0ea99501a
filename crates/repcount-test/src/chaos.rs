//! Chaos testing for pose input
//!
//! Simulates an unreliable pose detector:
//! - Keypoint position noise
//! - Dropped frames
//! - Pose dropouts (frames with no body)
//! - Low-confidence joints

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use repcount_core::{Joint, PoseFrame};

/// Detector chaos configuration
#[derive(Clone, Debug)]
pub struct DetectorChaosConfig {
    /// Standard deviation of keypoint position noise, normalized units
    pub position_noise: f32,
    /// Probability a frame never reaches the counter
    pub drop_rate: f64,
    /// Probability a dropout burst starts on a frame
    pub dropout_prob: f64,
    /// Dropout burst length range, frames
    pub dropout_length: (u32, u32),
    /// Probability one joint is reported with low confidence
    pub low_confidence_prob: f64,
    /// Confidence given to degraded joints
    pub low_confidence: f32,
}

impl Default for DetectorChaosConfig {
    fn default() -> Self {
        DetectorChaosConfig {
            position_noise: 0.005,
            drop_rate: 0.02,
            dropout_prob: 0.01,
            dropout_length: (1, 3),
            low_confidence_prob: 0.02,
            low_confidence: 0.1,
        }
    }
}

impl DetectorChaosConfig {
    /// Clean studio lighting, subject centred
    pub fn good() -> Self {
        DetectorChaosConfig {
            position_noise: 0.002,
            drop_rate: 0.005,
            dropout_prob: 0.001,
            dropout_length: (1, 2),
            low_confidence_prob: 0.005,
            low_confidence: 0.1,
        }
    }

    /// Living-room webcam
    pub fn poor() -> Self {
        DetectorChaosConfig {
            position_noise: 0.008,
            drop_rate: 0.05,
            dropout_prob: 0.02,
            dropout_length: (2, 4),
            low_confidence_prob: 0.05,
            low_confidence: 0.2,
        }
    }

    /// Backlit, partially occluded, overloaded device
    pub fn hostile() -> Self {
        DetectorChaosConfig {
            position_noise: 0.015,
            drop_rate: 0.15,
            dropout_prob: 0.05,
            dropout_length: (2, 6),
            low_confidence_prob: 0.15,
            low_confidence: 0.1,
        }
    }
}

/// Chaos statistics
#[derive(Clone, Debug, Default)]
pub struct DetectorChaosStats {
    pub frames_in: u64,
    pub frames_dropped: u64,
    pub frames_blanked: u64,
    pub joints_degraded: u64,
}

impl DetectorChaosStats {
    pub fn delivered(&self) -> u64 {
        self.frames_in - self.frames_dropped
    }
}

/// Seeded detector simulator
pub struct ChaosDetector {
    config: DetectorChaosConfig,
    rng: StdRng,
    dropout_remaining: u32,
    stats: DetectorChaosStats,
}

impl ChaosDetector {
    pub fn new(config: DetectorChaosConfig, seed: u64) -> Self {
        ChaosDetector {
            config,
            rng: StdRng::seed_from_u64(seed),
            dropout_remaining: 0,
            stats: DetectorChaosStats::default(),
        }
    }

    /// Pass a clean frame through the detector; `None` if it was dropped
    pub fn observe(&mut self, mut frame: PoseFrame) -> Option<PoseFrame> {
        self.stats.frames_in += 1;

        if self.rng.gen::<f64>() < self.config.drop_rate {
            self.stats.frames_dropped += 1;
            return None;
        }

        if self.in_dropout() {
            self.stats.frames_blanked += 1;
            return Some(PoseFrame::absent(frame.layout));
        }

        if self.config.position_noise > 0.0 {
            for kp in frame.keypoints.iter_mut() {
                kp.point.x += self.gaussian() * self.config.position_noise;
                kp.point.y += self.gaussian() * self.config.position_noise;
            }
        }

        if self.rng.gen::<f64>() < self.config.low_confidence_prob {
            let joints = Joint::all();
            let joint = joints[self.rng.gen_range(0..joints.len())];
            let idx = frame.layout.index_of(joint);
            if let Some(kp) = frame.keypoints.get_mut(idx) {
                kp.confidence = Some(self.config.low_confidence);
                self.stats.joints_degraded += 1;
            }
        }

        Some(frame)
    }

    fn in_dropout(&mut self) -> bool {
        if self.dropout_remaining > 0 {
            self.dropout_remaining -= 1;
            return true;
        }

        if self.rng.gen::<f64>() < self.config.dropout_prob {
            let (min, max) = self.config.dropout_length;
            // This frame is the first of the burst
            self.dropout_remaining = self.rng.gen_range(min..=max.max(min)).saturating_sub(1);
            return true;
        }

        false
    }

    /// Standard normal sample (Box-Muller)
    fn gaussian(&mut self) -> f32 {
        let u1: f64 = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = self.rng.gen();
        ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
    }

    pub fn stats(&self) -> &DetectorChaosStats {
        &self.stats
    }
}
