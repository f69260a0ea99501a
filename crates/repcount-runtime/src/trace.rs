//! Recorded session traces
//!
//! One JSON object per line, tagged by `"type"`:
//!
//! ```text
//! {"type":"start","client":"a","exercise":"squat"}
//! {"type":"frame","client":"a","t":0.10,"layout":"mediapipe33","keypoints":[[0.5,0.4,0.98],...]}
//! {"type":"reset","client":"a"}
//! {"type":"stop","client":"a"}
//! ```
//!
//! A keypoint is `[x, y]` or `[x, y, confidence]`. Blank lines and lines
//! starting with `#` are ignored.

use repcount_core::{ClientId, FrameTime, Keypoint, KeypointLayout, PoseFrame};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading a trace
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("line {line}: malformed event: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: keypoint {index} has {len} components, expected 2 or 3")]
    BadKeypoint { line: usize, index: usize, len: usize },

    #[error("line {line}: frame time {t} is not finite")]
    BadTime { line: usize, t: f64 },
}

/// One trace event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    Start {
        client: ClientId,
        exercise: String,
    },
    Frame {
        client: ClientId,
        /// Seconds on the client's clock
        t: f64,
        #[serde(default)]
        layout: KeypointLayout,
        #[serde(default)]
        keypoints: Vec<Vec<f32>>,
    },
    Reset {
        client: ClientId,
    },
    Stop {
        client: ClientId,
    },
}

impl TraceEvent {
    pub fn client(&self) -> &ClientId {
        match self {
            TraceEvent::Start { client, .. }
            | TraceEvent::Frame { client, .. }
            | TraceEvent::Reset { client }
            | TraceEvent::Stop { client } => client,
        }
    }

    /// Parse one line; `Ok(None)` for blank and comment lines
    pub fn parse_line(line_no: usize, line: &str) -> Result<Option<TraceEvent>, TraceError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let event: TraceEvent = serde_json::from_str(trimmed).map_err(|source| TraceError::Malformed {
            line: line_no,
            source,
        })?;
        event.check(line_no)?;
        Ok(Some(event))
    }

    fn check(&self, line_no: usize) -> Result<(), TraceError> {
        if let TraceEvent::Frame { t, keypoints, .. } = self {
            if !t.is_finite() {
                return Err(TraceError::BadTime { line: line_no, t: *t });
            }
            if let Some((index, kp)) = keypoints
                .iter()
                .enumerate()
                .find(|(_, kp)| kp.len() != 2 && kp.len() != 3)
            {
                return Err(TraceError::BadKeypoint {
                    line: line_no,
                    index,
                    len: kp.len(),
                });
            }
        }
        Ok(())
    }
}

/// Build a pose frame from raw `[x, y(, conf)]` rows
pub fn pose_frame(layout: KeypointLayout, keypoints: &[Vec<f32>]) -> PoseFrame {
    let keypoints = keypoints
        .iter()
        .map(|kp| match kp.as_slice() {
            [x, y, conf, ..] => Keypoint::with_confidence(*x, *y, *conf),
            [x, y] => Keypoint::new(*x, *y),
            _ => Keypoint::default(),
        })
        .collect();
    PoseFrame::new(layout, keypoints)
}

/// Serialize a frame back into trace form
pub fn frame_event(client: ClientId, t: FrameTime, frame: &PoseFrame) -> TraceEvent {
    TraceEvent::Frame {
        client,
        t: t.as_secs_f64(),
        layout: frame.layout,
        keypoints: frame
            .keypoints
            .iter()
            .map(|kp| match kp.confidence {
                Some(c) => vec![kp.point.x, kp.point.y, c],
                None => vec![kp.point.x, kp.point.y],
            })
            .collect(),
    }
}
