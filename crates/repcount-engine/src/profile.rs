//! Exercise profile table
//!
//! Every exercise is described by data: what to measure, the two threshold
//! values that bound a repetition, which way the value moves, and the
//! minimum time between counted repetitions. The state machine dispatches
//! on this data and never on the exercise name.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use repcount_core::{Joint, RepError, RepResult};
use repcount_signal::DEFAULT_SPREAD_CALIBRATION;
use serde::{Deserialize, Serialize};

use crate::Metric;

/// Registered exercise kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    Pushup,
    BicepCurl,
    JumpingJack,
    Lunge,
    ShoulderPress,
    SitUp,
}

impl ExerciseKind {
    /// All kinds in order
    pub fn all() -> &'static [ExerciseKind] {
        &[
            ExerciseKind::Squat,
            ExerciseKind::Pushup,
            ExerciseKind::BicepCurl,
            ExerciseKind::JumpingJack,
            ExerciseKind::Lunge,
            ExerciseKind::ShoulderPress,
            ExerciseKind::SitUp,
        ]
    }

    /// Canonical identifier
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::Pushup => "pushup",
            ExerciseKind::BicepCurl => "bicep_curl",
            ExerciseKind::JumpingJack => "jumping_jack",
            ExerciseKind::Lunge => "lunge",
            ExerciseKind::ShoulderPress => "shoulder_press",
            ExerciseKind::SitUp => "sit_up",
        }
    }

    /// Parse a kind name; accepts plural, hyphenated and spaced spellings
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "squat" | "squats" => Some(ExerciseKind::Squat),
            "pushup" | "pushups" | "push_up" | "push_ups" => Some(ExerciseKind::Pushup),
            "bicep_curl" | "bicep_curls" => Some(ExerciseKind::BicepCurl),
            "jumping_jack" | "jumping_jacks" => Some(ExerciseKind::JumpingJack),
            "lunge" | "lunges" => Some(ExerciseKind::Lunge),
            "shoulder_press" | "shoulder_presses" => Some(ExerciseKind::ShoulderPress),
            "sit_up" | "sit_ups" | "situp" | "situps" => Some(ExerciseKind::SitUp),
            _ => None,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = RepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExerciseKind::parse(s).ok_or_else(|| RepError::UnknownExerciseKind {
            requested: s.to_string(),
            supported: ExerciseKind::all().iter().map(|k| k.to_string()).collect(),
        })
    }
}

/// Which way the measured value moves from rest to the active position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Extended value is numerically larger (squat, curl)
    Descending,
    /// Extended value is numerically smaller (press, jumping jack)
    Ascending,
}

/// Immutable description of one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    pub name: String,
    pub description: String,
    pub metric: Metric,
    /// Rest position; crossing it establishes the reference stage
    pub extended_threshold: f32,
    /// Active position; crossing it from the reference stage completes a rep
    pub flexed_threshold: f32,
    pub direction: Direction,
    pub min_rep_interval: Duration,
    /// Stage word shown to users for the extended position ("up" for a squat)
    pub extended_label: String,
    /// Stage word shown to users for the flexed position ("down" for a squat)
    pub flexed_label: String,
}

impl ExerciseProfile {
    /// Is the value strictly past the extended threshold?
    pub fn is_past_extended(&self, value: f32) -> bool {
        match self.direction {
            Direction::Descending => value > self.extended_threshold,
            Direction::Ascending => value < self.extended_threshold,
        }
    }

    /// Is the value strictly past the flexed threshold?
    pub fn is_past_flexed(&self, value: f32) -> bool {
        match self.direction {
            Direction::Descending => value < self.flexed_threshold,
            Direction::Ascending => value > self.flexed_threshold,
        }
    }

    /// Is the value inside the band between the thresholds (inclusive)?
    pub fn is_in_band(&self, value: f32) -> bool {
        let lo = self.extended_threshold.min(self.flexed_threshold);
        let hi = self.extended_threshold.max(self.flexed_threshold);
        (lo..=hi).contains(&value)
    }

    /// Copy of this profile with a different cooldown
    pub fn with_min_rep_interval(&self, interval: Duration) -> Self {
        ExerciseProfile {
            min_rep_interval: interval,
            ..self.clone()
        }
    }

    /// Copy of this profile with different thresholds
    pub fn with_thresholds(&self, extended: f32, flexed: f32) -> Self {
        ExerciseProfile {
            extended_threshold: extended,
            flexed_threshold: flexed,
            ..self.clone()
        }
    }

    /// Check thresholds and metric are usable
    pub fn validate(&self) -> RepResult<()> {
        let invalid = |reason: &str| RepError::InvalidProfile {
            kind: self.kind.to_string(),
            reason: reason.to_string(),
        };

        if !self.extended_threshold.is_finite() || !self.flexed_threshold.is_finite() {
            return Err(invalid("thresholds must be finite"));
        }

        let ordered = match self.direction {
            Direction::Descending => self.extended_threshold > self.flexed_threshold,
            Direction::Ascending => self.extended_threshold < self.flexed_threshold,
        };
        if !ordered {
            return Err(invalid("threshold order contradicts direction"));
        }

        match self.metric {
            Metric::JointAngle { first, vertex, last } => {
                if first == vertex || last == vertex || first == last {
                    return Err(invalid("joint triple must name three distinct joints"));
                }
                let in_range = |v: f32| (0.0..=180.0).contains(&v);
                if !in_range(self.extended_threshold) || !in_range(self.flexed_threshold) {
                    return Err(invalid("angle thresholds must lie in [0, 180]"));
                }
            }
            Metric::Spread {
                from,
                to,
                calibration,
            } => {
                if from == to {
                    return Err(invalid("spread needs two distinct joints"));
                }
                if !calibration.is_finite() || calibration <= 0.0 {
                    return Err(invalid("spread calibration must be positive"));
                }
            }
        }

        Ok(())
    }

    /// Built-in profile for a kind
    pub fn standard(kind: ExerciseKind) -> Self {
        let elbow = Metric::JointAngle {
            first: Joint::LeftShoulder,
            vertex: Joint::LeftElbow,
            last: Joint::LeftWrist,
        };

        let (name, description, metric, extended, flexed, direction, cooldown_ms, labels) =
            match kind {
                ExerciseKind::Squat => (
                    "Squats",
                    "Knee bends with controlled depth",
                    Metric::JointAngle {
                        first: Joint::LeftAnkle,
                        vertex: Joint::LeftKnee,
                        last: Joint::LeftHip,
                    },
                    160.0,
                    90.0,
                    Direction::Descending,
                    500,
                    ("up", "down"),
                ),
                ExerciseKind::Pushup => (
                    "Push-ups",
                    "Upper body press from the floor",
                    elbow,
                    160.0,
                    90.0,
                    Direction::Descending,
                    800,
                    ("up", "down"),
                ),
                ExerciseKind::BicepCurl => (
                    "Bicep Curls",
                    "Elbow flexion curl",
                    elbow,
                    160.0,
                    50.0,
                    Direction::Descending,
                    600,
                    ("down", "up"),
                ),
                ExerciseKind::JumpingJack => (
                    "Jumping Jacks",
                    "Full body cardio, measured by shoulder spread",
                    Metric::Spread {
                        from: Joint::LeftShoulder,
                        to: Joint::RightShoulder,
                        calibration: DEFAULT_SPREAD_CALIBRATION,
                    },
                    1.2,
                    1.8,
                    Direction::Ascending,
                    300,
                    ("down", "up"),
                ),
                ExerciseKind::Lunge => (
                    "Lunges",
                    "Single-leg lower body bend",
                    Metric::JointAngle {
                        first: Joint::LeftHip,
                        vertex: Joint::LeftKnee,
                        last: Joint::LeftAnkle,
                    },
                    160.0,
                    90.0,
                    Direction::Descending,
                    700,
                    ("up", "down"),
                ),
                ExerciseKind::ShoulderPress => (
                    "Shoulder Press",
                    "Overhead press from shoulder height",
                    elbow,
                    90.0,
                    160.0,
                    Direction::Ascending,
                    600,
                    ("down", "up"),
                ),
                ExerciseKind::SitUp => (
                    "Sit-ups",
                    "Core flexion measured at the hip",
                    Metric::JointAngle {
                        first: Joint::LeftShoulder,
                        vertex: Joint::LeftHip,
                        last: Joint::LeftAnkle,
                    },
                    145.0,
                    170.0,
                    Direction::Ascending,
                    800,
                    ("down", "up"),
                ),
            };

        ExerciseProfile {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            metric,
            extended_threshold: extended,
            flexed_threshold: flexed,
            direction,
            min_rep_interval: Duration::from_millis(cooldown_ms),
            extended_label: labels.0.to_string(),
            flexed_label: labels.1.to_string(),
        }
    }
}

/// Shared, read-only exercise table
///
/// Built once at startup, then wrapped in an `Arc` and read by every
/// session without locking.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    profiles: BTreeMap<ExerciseKind, Arc<ExerciseProfile>>,
}

impl ProfileTable {
    /// Table with no exercises
    pub fn empty() -> Self {
        ProfileTable::default()
    }

    /// Table with every built-in exercise
    pub fn standard() -> Self {
        let profiles = ExerciseKind::all()
            .iter()
            .map(|&kind| (kind, Arc::new(ExerciseProfile::standard(kind))))
            .collect();
        ProfileTable { profiles }
    }

    /// Add or replace a profile after validating it
    pub fn register(&mut self, profile: ExerciseProfile) -> RepResult<()> {
        profile.validate()?;
        self.profiles.insert(profile.kind, Arc::new(profile));
        Ok(())
    }

    /// Look up a registered kind
    pub fn profile_for(&self, kind: ExerciseKind) -> RepResult<Arc<ExerciseProfile>> {
        self.profiles
            .get(&kind)
            .cloned()
            .ok_or_else(|| self.unknown(kind.as_str()))
    }

    /// Look up by name; unknown or unregistered names are rejected
    pub fn resolve(&self, name: &str) -> RepResult<Arc<ExerciseProfile>> {
        ExerciseKind::parse(name)
            .and_then(|kind| self.profiles.get(&kind).cloned())
            .ok_or_else(|| self.unknown(name))
    }

    /// Canonical names of registered kinds
    pub fn supported(&self) -> Vec<String> {
        self.profiles.keys().map(|k| k.to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ExerciseProfile>> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn unknown(&self, requested: &str) -> RepError {
        RepError::UnknownExerciseKind {
            requested: requested.to_string(),
            supported: self.supported(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_profiles_validate() {
        let table = ProfileTable::standard();
        assert_eq!(table.len(), ExerciseKind::all().len());
        for profile in table.iter() {
            profile.validate().unwrap();
        }
    }

    #[test]
    fn test_parse_accepts_legacy_spellings() {
        assert_eq!(ExerciseKind::parse("squats"), Some(ExerciseKind::Squat));
        assert_eq!(ExerciseKind::parse("Bicep-Curls"), Some(ExerciseKind::BicepCurl));
        assert_eq!(ExerciseKind::parse("situps"), Some(ExerciseKind::SitUp));
        assert_eq!(ExerciseKind::parse(" push ups "), Some(ExerciseKind::Pushup));
        assert_eq!(ExerciseKind::parse("burpee"), None);
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for &kind in ExerciseKind::all() {
            assert_eq!(kind.as_str().parse::<ExerciseKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_resolve_rejects_unknown_with_list() {
        let table = ProfileTable::standard();
        match table.resolve("burpee") {
            Err(RepError::UnknownExerciseKind {
                requested,
                supported,
            }) => {
                assert_eq!(requested, "burpee");
                assert_eq!(supported.len(), 7);
                assert!(supported.contains(&"jumping_jack".to_string()));
            }
            other => panic!("expected UnknownExerciseKind, got {:?}", other),
        }
    }

    #[test]
    fn test_unregistered_kind_is_unknown() {
        let mut table = ProfileTable::empty();
        table
            .register(ExerciseProfile::standard(ExerciseKind::Squat))
            .unwrap();

        assert!(table.resolve("squat").is_ok());
        assert!(matches!(
            table.profile_for(ExerciseKind::Lunge),
            Err(RepError::UnknownExerciseKind { .. })
        ));
    }

    #[test]
    fn test_register_rejects_contradicting_direction() {
        let mut table = ProfileTable::empty();
        let bad = ExerciseProfile::standard(ExerciseKind::Squat).with_thresholds(90.0, 160.0);
        assert!(matches!(
            table.register(bad),
            Err(RepError::InvalidProfile { .. })
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_direction_predicates() {
        let squat = ExerciseProfile::standard(ExerciseKind::Squat);
        assert!(squat.is_past_extended(161.0));
        assert!(!squat.is_past_extended(160.0));
        assert!(squat.is_past_flexed(89.0));
        assert!(squat.is_in_band(90.0) && squat.is_in_band(160.0));

        let press = ExerciseProfile::standard(ExerciseKind::ShoulderPress);
        assert!(press.is_past_extended(80.0));
        assert!(press.is_past_flexed(170.0));
        assert!(press.is_in_band(120.0));
    }

    #[test]
    fn test_curl_labels_are_inverted() {
        let curl = ExerciseProfile::standard(ExerciseKind::BicepCurl);
        assert_eq!(curl.extended_label, "down");
        assert_eq!(curl.flexed_label, "up");
        assert_eq!(curl.direction, Direction::Descending);
    }
}
