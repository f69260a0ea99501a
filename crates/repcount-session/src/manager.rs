//! Session manager - maps client ids to isolated counting sessions
//!
//! The map is behind a read-write lock that is held only long enough to
//! clone a slot handle. Each slot has its own mutex, so concurrent frames
//! for different clients proceed in parallel and frames for one client are
//! serialized. A destroyed slot is marked closed before it is dropped; a
//! frame racing with destruction sees the flag and fails instead of
//! touching state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use repcount_core::{ClientId, FrameTime, PoseFrame, RepError, RepResult};
use repcount_engine::{
    ExerciseKind, ExerciseProfile, Observation, PostureState, ProfileTable, RepSession, Stage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{DuplicatePolicy, SessionConfig};

/// How a frame was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSignal {
    /// A value was measured and fed to the state machine
    Measured,
    /// Joints were present but the geometry was undefined
    Degenerate,
    /// No usable pose (absent, truncated, or below the confidence gate)
    MissingPose,
    /// Older than the last processed frame; dropped
    OutOfOrder,
}

/// Per-frame answer returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub reps: u32,
    pub stage: Stage,
    /// Exercise-specific word for `stage` ("up", "down", "detecting")
    pub stage_label: String,
    pub posture_state: PostureState,
    /// Smoothed metric value; the previous one when this frame gave none
    pub angle: f32,
    pub rep_completed: bool,
    pub pose_detected: bool,
    pub signal: FrameSignal,
}

/// Frame counters kept per session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Frames accepted in order
    pub frames_processed: u64,
    /// Accepted frames that carried no usable pose
    pub frames_without_pose: u64,
    /// Accepted frames with degenerate geometry
    pub frames_degenerate: u64,
    /// Frames dropped as out of order
    pub frames_dropped: u64,
}

/// Returned by `create_session`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub client_id: ClientId,
    pub kind: ExerciseKind,
    pub exercise: String,
    /// True when an existing session under this id was replaced
    pub replaced: bool,
}

/// Point-in-time view of a live session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub client_id: ClientId,
    pub kind: ExerciseKind,
    pub reps: u32,
    pub stage: Stage,
    pub stage_label: String,
    pub posture_state: PostureState,
    pub angle: Option<f32>,
    pub last_rep_time: Option<FrameTime>,
    pub last_frame_time: Option<FrameTime>,
    pub stats: SessionStats,
}

/// Final tally returned by `destroy_session`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub client_id: ClientId,
    pub kind: ExerciseKind,
    pub reps: u32,
    pub stats: SessionStats,
}

struct SessionSlot {
    client_id: ClientId,
    session: RepSession,
    last_frame: Option<FrameTime>,
    stats: SessionStats,
    closed: bool,
}

impl SessionSlot {
    fn new(client_id: ClientId, profile: Arc<ExerciseProfile>, smoothing: usize) -> Self {
        SessionSlot {
            client_id,
            session: RepSession::new(profile, smoothing),
            last_frame: None,
            stats: SessionStats::default(),
            closed: false,
        }
    }

    fn process(&mut self, frame: &PoseFrame, now: FrameTime, min_confidence: f32) -> FrameResult {
        if let Some(last) = self.last_frame {
            if now < last {
                self.stats.frames_dropped += 1;
                debug!(client = %self.client_id, ?now, ?last, "dropping out-of-order frame");
                return self.result(false, false, FrameSignal::OutOfOrder);
            }
        }
        self.last_frame = Some(now);
        self.stats.frames_processed += 1;

        let measurement = self.session.profile().metric.measure(frame, min_confidence);
        let observation = self.session.observe(measurement, now);

        let signal = match observation {
            Observation::Advanced(_) => FrameSignal::Measured,
            Observation::Degenerate => {
                self.stats.frames_degenerate += 1;
                FrameSignal::Degenerate
            }
            Observation::Skipped(m) => {
                self.stats.frames_without_pose += 1;
                debug!(client = %self.client_id, measurement = ?m, "frame skipped");
                FrameSignal::MissingPose
            }
        };

        self.result(observation.rep_completed(), observation.pose_detected(), signal)
    }

    fn result(&self, rep_completed: bool, pose_detected: bool, signal: FrameSignal) -> FrameResult {
        FrameResult {
            reps: self.session.count(),
            stage: self.session.stage(),
            stage_label: self.session.stage_label().to_string(),
            posture_state: self.session.posture(),
            angle: self.session.last_value().unwrap_or(0.0),
            rep_completed,
            pose_detected,
            signal,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            client_id: self.client_id.clone(),
            kind: self.session.kind(),
            reps: self.session.count(),
            stage: self.session.stage(),
            stage_label: self.session.stage_label().to_string(),
            posture_state: self.session.posture(),
            angle: self.session.last_value(),
            last_rep_time: self.session.last_rep_time(),
            last_frame_time: self.last_frame,
            stats: self.stats,
        }
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            client_id: self.client_id.clone(),
            kind: self.session.kind(),
            reps: self.session.count(),
            stats: self.stats,
        }
    }
}

type SlotRef = Arc<Mutex<SessionSlot>>;

/// Concurrent registry of counting sessions
pub struct SessionManager {
    profiles: Arc<ProfileTable>,
    config: SessionConfig,
    sessions: RwLock<HashMap<ClientId, SlotRef>>,
}

impl SessionManager {
    pub fn new(profiles: Arc<ProfileTable>, config: SessionConfig) -> Self {
        SessionManager {
            profiles,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Manager over the built-in profiles with default configuration
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(ProfileTable::standard()), SessionConfig::default())
    }

    /// Start counting `exercise` for `client_id`
    pub fn create_session(
        &self,
        client_id: impl Into<ClientId>,
        exercise: &str,
    ) -> RepResult<SessionHandle> {
        let client_id = client_id.into();
        let profile = self.profiles.resolve(exercise).map_err(|e| {
            warn!(client = %client_id, exercise, "rejecting session: unknown exercise");
            e
        })?;

        let mut sessions = self.sessions.write();
        let mut replaced = false;

        if let Some(existing) = sessions.get(&client_id) {
            match self.config.duplicate_policy {
                DuplicatePolicy::Reject => {
                    warn!(client = %client_id, "rejecting duplicate session");
                    return Err(RepError::DuplicateSession(client_id));
                }
                DuplicatePolicy::Replace => {
                    existing.lock().closed = true;
                    replaced = true;
                }
            }
        } else if sessions.len() >= self.config.max_sessions {
            warn!(client = %client_id, limit = self.config.max_sessions, "session limit reached");
            return Err(RepError::SessionLimitReached {
                limit: self.config.max_sessions,
            });
        }

        let kind = profile.kind;
        let handle = SessionHandle {
            client_id: client_id.clone(),
            kind,
            exercise: profile.name.clone(),
            replaced,
        };
        let slot = SessionSlot::new(client_id.clone(), profile, self.config.smoothing_window);
        sessions.insert(client_id.clone(), Arc::new(Mutex::new(slot)));

        info!(client = %client_id, %kind, replaced, active = sessions.len(), "session created");
        Ok(handle)
    }

    /// Feed one frame observed at caller-supplied time `now`
    pub fn process_frame(
        &self,
        client_id: &ClientId,
        frame: &PoseFrame,
        now: FrameTime,
    ) -> RepResult<FrameResult> {
        let slot = self.slot(client_id)?;
        self.process_on(client_id, &slot, frame, now)
    }

    /// Zero the count and forget history; the exercise is kept
    pub fn reset_session(&self, client_id: &ClientId) -> RepResult<()> {
        let slot = self.slot(client_id)?;
        self.reset_on(client_id, &slot)
    }

    /// Discard a session; later operations on the id fail until it is recreated
    pub fn destroy_session(&self, client_id: &ClientId) -> RepResult<SessionSummary> {
        let slot = self
            .sessions
            .write()
            .remove(client_id)
            .ok_or_else(|| RepError::UnknownSession(client_id.clone()))?;

        let mut slot = slot.lock();
        slot.closed = true;
        let summary = slot.summary();
        info!(client = %client_id, reps = summary.reps, frames = summary.stats.frames_processed, "session destroyed");
        Ok(summary)
    }

    pub fn snapshot(&self, client_id: &ClientId) -> RepResult<SessionSnapshot> {
        let slot = self.slot(client_id)?;
        let slot = slot.lock();
        Ok(slot.snapshot())
    }

    /// Live client ids, sorted
    pub fn active_sessions(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.sessions.read().contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn profiles(&self) -> &Arc<ProfileTable> {
        &self.profiles
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Process on a slot handle that may have been closed since lookup
    fn process_on(
        &self,
        client_id: &ClientId,
        slot: &SlotRef,
        frame: &PoseFrame,
        now: FrameTime,
    ) -> RepResult<FrameResult> {
        let mut slot = slot.lock();
        if slot.closed {
            debug!(client = %client_id, "frame raced session close");
            return Err(RepError::UnknownSession(client_id.clone()));
        }
        Ok(slot.process(frame, now, self.config.min_confidence))
    }

    fn reset_on(&self, client_id: &ClientId, slot: &SlotRef) -> RepResult<()> {
        let mut slot = slot.lock();
        if slot.closed {
            return Err(RepError::UnknownSession(client_id.clone()));
        }
        slot.session.reset();
        slot.last_frame = None;
        info!(client = %client_id, "session reset");
        Ok(())
    }

    fn slot(&self, client_id: &ClientId) -> RepResult<SlotRef> {
        self.sessions
            .read()
            .get(client_id)
            .cloned()
            .ok_or_else(|| RepError::UnknownSession(client_id.clone()))
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}
