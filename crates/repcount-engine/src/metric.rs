//! What an exercise measures, and the per-frame measurement outcome

use repcount_core::{Joint, JointPoint, PoseFrame};
use repcount_signal::{checked_angle, checked_spread_ratio};
use serde::{Deserialize, Serialize};

/// Scalar an exercise profile tracks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metric {
    /// Interior angle at `vertex` between `first` and `last`, degrees
    JointAngle {
        first: Joint,
        vertex: Joint,
        last: Joint,
    },
    /// Distance between two joints over a calibration length
    Spread {
        from: Joint,
        to: Joint,
        calibration: f32,
    },
}

/// Result of measuring one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// A usable value (finite)
    Value(f32),
    /// Joints present but geometry is undefined (coincident / non-finite)
    Degenerate,
    /// No landmarks at all this frame
    MissingPose,
    /// The frame is too short to contain this joint
    MissingJoint(Joint),
    /// The joint is below the confidence threshold
    LowConfidence(Joint),
}

impl Measurement {
    /// Did the detector see a usable body this frame?
    pub fn pose_detected(&self) -> bool {
        matches!(self, Measurement::Value(_) | Measurement::Degenerate)
    }

    pub fn value(&self) -> Option<f32> {
        match self {
            Measurement::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl Metric {
    /// Joints this metric reads
    pub fn joints(&self) -> Vec<Joint> {
        match *self {
            Metric::JointAngle { first, vertex, last } => vec![first, vertex, last],
            Metric::Spread { from, to, .. } => vec![from, to],
        }
    }

    /// Measure a frame, gating every required joint on `min_confidence`
    pub fn measure(&self, frame: &PoseFrame, min_confidence: f32) -> Measurement {
        if !frame.has_pose() {
            return Measurement::MissingPose;
        }

        let point = |joint: Joint| -> Result<JointPoint, Measurement> {
            let keypoint = frame.joint(joint).ok_or(Measurement::MissingJoint(joint))?;
            if !keypoint.is_confident(min_confidence) {
                return Err(Measurement::LowConfidence(joint));
            }
            Ok(keypoint.point)
        };

        let value = match *self {
            Metric::JointAngle { first, vertex, last } => {
                let (a, b, c) = match (point(first), point(vertex), point(last)) {
                    (Ok(a), Ok(b), Ok(c)) => (a, b, c),
                    (Err(m), _, _) | (_, Err(m), _) | (_, _, Err(m)) => return m,
                };
                checked_angle(a, b, c)
            }
            Metric::Spread {
                from,
                to,
                calibration,
            } => {
                let (p, q) = match (point(from), point(to)) {
                    (Ok(p), Ok(q)) => (p, q),
                    (Err(m), _) | (_, Err(m)) => return m,
                };
                checked_spread_ratio(p, q, calibration)
            }
        };

        value.map_or(Measurement::Degenerate, Measurement::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcount_core::{Keypoint, KeypointLayout};

    const KNEE: Metric = Metric::JointAngle {
        first: Joint::LeftAnkle,
        vertex: Joint::LeftKnee,
        last: Joint::LeftHip,
    };

    fn knee_frame(layout: KeypointLayout, hip: Keypoint) -> PoseFrame {
        let mut frame = PoseFrame::blank(layout);
        frame.set_joint(Joint::LeftAnkle, Keypoint::new(0.5, 0.9));
        frame.set_joint(Joint::LeftKnee, Keypoint::new(0.5, 0.7));
        frame.set_joint(Joint::LeftHip, hip);
        frame
    }

    #[test]
    fn test_angle_through_both_layouts() {
        for layout in [KeypointLayout::MediaPipe33, KeypointLayout::Coco17] {
            let frame = knee_frame(layout, Keypoint::new(0.7, 0.7));
            let value = KNEE.measure(&frame, 0.5).value().unwrap();
            assert!((value - 90.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_empty_frame_is_missing_pose() {
        let frame = PoseFrame::absent(KeypointLayout::MediaPipe33);
        assert_eq!(KNEE.measure(&frame, 0.5), Measurement::MissingPose);
        assert!(!Measurement::MissingPose.pose_detected());
    }

    #[test]
    fn test_short_frame_is_missing_joint() {
        let frame = PoseFrame::new(KeypointLayout::MediaPipe33, vec![Keypoint::new(0.1, 0.1); 20]);
        assert_eq!(KNEE.measure(&frame, 0.5), Measurement::MissingJoint(Joint::LeftAnkle));
    }

    #[test]
    fn test_low_confidence_joint() {
        let frame = knee_frame(KeypointLayout::Coco17, Keypoint::with_confidence(0.7, 0.7, 0.1));
        assert_eq!(KNEE.measure(&frame, 0.3), Measurement::LowConfidence(Joint::LeftHip));
        assert!(KNEE.measure(&frame, 0.05).value().is_some());
    }

    #[test]
    fn test_coincident_joints_are_degenerate() {
        let frame = knee_frame(KeypointLayout::Coco17, Keypoint::new(0.5, 0.7));
        let m = KNEE.measure(&frame, 0.5);
        assert_eq!(m, Measurement::Degenerate);
        assert!(m.pose_detected());
    }

    #[test]
    fn test_spread_metric() {
        let metric = Metric::Spread {
            from: Joint::LeftShoulder,
            to: Joint::RightShoulder,
            calibration: 0.3,
        };
        let mut frame = PoseFrame::blank(KeypointLayout::MediaPipe33);
        frame.set_joint(Joint::LeftShoulder, Keypoint::new(0.35, 0.4));
        frame.set_joint(Joint::RightShoulder, Keypoint::new(0.65, 0.4));

        let ratio = metric.measure(&frame, 0.5).value().unwrap();
        assert!((ratio - 1.0).abs() < 1e-4);
        assert_eq!(metric.joints(), vec![Joint::LeftShoulder, Joint::RightShoulder]);
    }
}
