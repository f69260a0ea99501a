//! End-to-end counting scenarios
//!
//! Drives scripted motion through an optional chaos detector into a real
//! session manager and reports what was counted.

use std::sync::Arc;

use repcount_core::{ClientId, RepResult};
use repcount_engine::{ExerciseKind, ProfileTable};
use repcount_session::{FrameResult, FrameSignal, SessionConfig, SessionManager};

use crate::chaos::{ChaosDetector, DetectorChaosConfig};
use crate::motion::MotionScript;

// ============================================================================
// SCENARIO
// ============================================================================

/// One client performing one exercise
#[derive(Clone, Debug)]
pub struct Scenario {
    pub kind: ExerciseKind,
    pub script: MotionScript,
    /// Detector chaos and seed; clean input when `None`
    pub chaos: Option<(DetectorChaosConfig, u64)>,
    pub session: SessionConfig,
}

impl Scenario {
    pub fn clean(kind: ExerciseKind, reps: u32) -> Self {
        Scenario {
            kind,
            script: MotionScript::reps(reps),
            chaos: None,
            session: SessionConfig::default(),
        }
    }

    pub fn with_chaos(mut self, config: DetectorChaosConfig, seed: u64) -> Self {
        self.chaos = Some((config, seed));
        self
    }

    pub fn with_script(mut self, script: MotionScript) -> Self {
        self.script = script;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn expected_reps(&self) -> u32 {
        self.script.reps
    }

    /// Run against a fresh manager
    pub fn run(&self) -> RepResult<ScenarioOutcome> {
        let manager = SessionManager::new(Arc::new(ProfileTable::standard()), self.session.clone());
        self.run_on(&manager, ClientId::new(self.kind.as_str()))
    }

    /// Run as `client` on an existing manager
    pub fn run_on(&self, manager: &SessionManager, client: ClientId) -> RepResult<ScenarioOutcome> {
        let profile = manager.profiles().profile_for(self.kind)?;
        manager.create_session(client.clone(), self.kind.as_str())?;

        let mut detector = self
            .chaos
            .as_ref()
            .map(|(config, seed)| ChaosDetector::new(config.clone(), *seed));

        let mut outcome = ScenarioOutcome {
            expected: self.expected_reps(),
            ..Default::default()
        };

        for (t, frame) in self.script.frames(&profile) {
            let frame = match detector.as_mut() {
                Some(d) => match d.observe(frame) {
                    Some(f) => f,
                    None => continue,
                },
                None => frame,
            };

            let result = manager.process_frame(&client, &frame, t)?;
            outcome.record(&result);
        }

        outcome.summary_reps = manager.destroy_session(&client)?.reps;
        Ok(outcome)
    }
}

/// What a scenario produced
#[derive(Clone, Debug, Default)]
pub struct ScenarioOutcome {
    pub expected: u32,
    /// Count reported by the last frame
    pub counted: u32,
    /// Frames flagged `rep_completed`
    pub completions: u32,
    pub frames: u32,
    pub frames_without_pose: u32,
    pub degenerate: u32,
    /// Count in the destroy summary
    pub summary_reps: u32,
    /// Reported counts were never lower than an earlier one
    pub monotonic: bool,
}

impl ScenarioOutcome {
    fn record(&mut self, result: &FrameResult) {
        if self.frames == 0 {
            self.monotonic = true;
        }
        self.frames += 1;
        if result.reps < self.counted {
            self.monotonic = false;
        }
        self.counted = result.reps;
        if result.rep_completed {
            self.completions += 1;
        }
        match result.signal {
            FrameSignal::MissingPose => self.frames_without_pose += 1,
            FrameSignal::Degenerate => self.degenerate += 1,
            FrameSignal::Measured | FrameSignal::OutOfOrder => {}
        }
    }

    pub fn exact(&self) -> bool {
        self.counted == self.expected
    }
}
