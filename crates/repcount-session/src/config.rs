//! Session manager configuration

use std::env;
use std::fmt;
use std::str::FromStr;

use repcount_core::{RepError, RepResult};
use repcount_signal::DEFAULT_SMOOTHING_WINDOW;
use serde::{Deserialize, Serialize};

/// What `create_session` does when the client id is already live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `DuplicateSession`; the live session is untouched
    #[default]
    Reject,
    /// Close the live session and start a fresh one under the same id
    Replace,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Reject => write!(f, "reject"),
            DuplicatePolicy::Replace => write!(f, "replace"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = RepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(DuplicatePolicy::Reject),
            "replace" => Ok(DuplicatePolicy::Replace),
            other => Err(RepError::InvalidConfig(format!(
                "duplicate policy must be `reject` or `replace`, got `{other}`"
            ))),
        }
    }
}

/// Session manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Samples in each session's moving average (1 disables smoothing)
    pub smoothing_window: usize,
    /// Joints below this detector confidence are treated as absent
    pub min_confidence: f32,
    /// Upper bound on concurrently live sessions
    pub max_sessions: usize,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            min_confidence: 0.5,
            max_sessions: 1024,
            duplicate_policy: DuplicatePolicy::Reject,
        }
    }
}

impl SessionConfig {
    pub const ENV_SMOOTHING_WINDOW: &'static str = "REPCOUNT_SMOOTHING_WINDOW";
    pub const ENV_MIN_CONFIDENCE: &'static str = "REPCOUNT_MIN_CONFIDENCE";
    pub const ENV_MAX_SESSIONS: &'static str = "REPCOUNT_MAX_SESSIONS";
    pub const ENV_DUPLICATE_POLICY: &'static str = "REPCOUNT_DUPLICATE_POLICY";

    /// Two-sample window for clients that need the stage to react quickly
    pub fn low_latency() -> Self {
        SessionConfig {
            smoothing_window: 2,
            ..Default::default()
        }
    }

    /// Wider window and stricter confidence gate for noisy detectors
    pub fn noisy_detector() -> Self {
        SessionConfig {
            smoothing_window: 5,
            min_confidence: 0.7,
            ..Default::default()
        }
    }

    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a variable is set but cannot be parsed or
    /// is out of range.
    pub fn from_env() -> RepResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> RepResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SessionConfig::default();

        if let Some(raw) = lookup(Self::ENV_SMOOTHING_WINDOW) {
            config.smoothing_window = parse_var(Self::ENV_SMOOTHING_WINDOW, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_MIN_CONFIDENCE) {
            config.min_confidence = parse_var(Self::ENV_MIN_CONFIDENCE, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_MAX_SESSIONS) {
            config.max_sessions = parse_var(Self::ENV_MAX_SESSIONS, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_DUPLICATE_POLICY) {
            config.duplicate_policy = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check ranges
    pub fn validate(&self) -> RepResult<()> {
        if self.smoothing_window == 0 {
            return Err(RepError::InvalidConfig(
                "smoothing window must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(RepError::InvalidConfig(format!(
                "min confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.max_sessions == 0 {
            return Err(RepError::InvalidConfig(
                "max sessions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, raw: &str) -> RepResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RepError::InvalidConfig(format!("invalid {key} value `{raw}`: {e}")))
}
