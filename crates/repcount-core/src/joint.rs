//! Joints and keypoints as delivered by the external pose estimator
//!
//! The estimator is a black box. Each frame it hands over an indexed list of
//! keypoints; a `KeypointLayout` says which index holds which joint.

use serde::{Deserialize, Serialize};

/// Joint identifier - the minimal set needed across all exercise profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    // Arms
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,

    // Legs
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// All joints in order
    pub fn all() -> &'static [Joint] {
        &[
            Joint::LeftShoulder,
            Joint::RightShoulder,
            Joint::LeftElbow,
            Joint::RightElbow,
            Joint::LeftWrist,
            Joint::RightWrist,
            Joint::LeftHip,
            Joint::RightHip,
            Joint::LeftKnee,
            Joint::RightKnee,
            Joint::LeftAnkle,
            Joint::RightAnkle,
        ]
    }

    /// Number of joints
    pub fn count() -> usize {
        12
    }
}

/// Keypoint index layout of a pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeypointLayout {
    /// 33-landmark BlazePose / MediaPipe layout
    #[default]
    #[serde(rename = "mediapipe33", alias = "mediapipe")]
    MediaPipe33,
    /// 17-keypoint COCO layout (RTMPose and most top-down detectors)
    #[serde(rename = "coco17", alias = "coco")]
    Coco17,
}

impl KeypointLayout {
    /// Index of a joint in this layout's keypoint list
    pub fn index_of(self, joint: Joint) -> usize {
        match self {
            KeypointLayout::MediaPipe33 => match joint {
                Joint::LeftShoulder => 11,
                Joint::RightShoulder => 12,
                Joint::LeftElbow => 13,
                Joint::RightElbow => 14,
                Joint::LeftWrist => 15,
                Joint::RightWrist => 16,
                Joint::LeftHip => 23,
                Joint::RightHip => 24,
                Joint::LeftKnee => 25,
                Joint::RightKnee => 26,
                Joint::LeftAnkle => 27,
                Joint::RightAnkle => 28,
            },
            KeypointLayout::Coco17 => match joint {
                Joint::LeftShoulder => 5,
                Joint::RightShoulder => 6,
                Joint::LeftElbow => 7,
                Joint::RightElbow => 8,
                Joint::LeftWrist => 9,
                Joint::RightWrist => 10,
                Joint::LeftHip => 11,
                Joint::RightHip => 12,
                Joint::LeftKnee => 13,
                Joint::RightKnee => 14,
                Joint::LeftAnkle => 15,
                Joint::RightAnkle => 16,
            },
        }
    }

    /// Number of keypoints a full frame carries in this layout
    pub fn keypoint_count(self) -> usize {
        match self {
            KeypointLayout::MediaPipe33 => 33,
            KeypointLayout::Coco17 => 17,
        }
    }
}

/// 2D point, normalized image space or pixels (consistent within a session)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointPoint {
    pub x: f32,
    pub y: f32,
}

impl JointPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &JointPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One detected keypoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub point: JointPoint,
    /// Detector confidence / visibility, if the estimator reports one
    pub confidence: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            point: JointPoint::new(x, y),
            confidence: None,
        }
    }

    pub fn with_confidence(x: f32, y: f32, confidence: f32) -> Self {
        Self {
            point: JointPoint::new(x, y),
            confidence: Some(confidence),
        }
    }

    /// Keypoints without a confidence score are trusted
    pub fn is_confident(&self, min_confidence: f32) -> bool {
        self.confidence.map_or(true, |c| c >= min_confidence)
    }
}

/// Keypoints of one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub layout: KeypointLayout,
    pub keypoints: Vec<Keypoint>,
}

impl PoseFrame {
    pub fn new(layout: KeypointLayout, keypoints: Vec<Keypoint>) -> Self {
        Self { layout, keypoints }
    }

    /// No body detected this frame
    pub fn absent(layout: KeypointLayout) -> Self {
        Self {
            layout,
            keypoints: Vec::new(),
        }
    }

    /// A full-length frame with every keypoint at the origin
    pub fn blank(layout: KeypointLayout) -> Self {
        Self {
            layout,
            keypoints: vec![Keypoint::default(); layout.keypoint_count()],
        }
    }

    /// Were any landmarks returned?
    pub fn has_pose(&self) -> bool {
        !self.keypoints.is_empty()
    }

    /// Get keypoint by joint
    pub fn joint(&self, joint: Joint) -> Option<&Keypoint> {
        self.keypoints.get(self.layout.index_of(joint))
    }

    /// Set keypoint by joint, growing the list if the frame is short
    pub fn set_joint(&mut self, joint: Joint, keypoint: Keypoint) {
        let idx = self.layout.index_of(joint);
        if idx >= self.keypoints.len() {
            self.keypoints.resize(idx + 1, Keypoint::default());
        }
        self.keypoints[idx] = keypoint;
    }
}
