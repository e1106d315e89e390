//! Core domain types for the push-up counter.
//!
//! This module defines the fundamental types used throughout the system:
//! - The joint vocabulary and per-frame keypoints
//! - Poses (the full keypoint set for one frame)
//! - Repetition state and completed-repetition events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Joint and Keypoint Types
// ============================================================================

/// The closed vocabulary of body joints reported by the pose source.
///
/// Serialized names match the external estimator's wire names
/// (`left_shoulder`, `right_elbow`, ...).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// One detected body landmark in one frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: JointName,
    pub x: f64,
    pub y: f64,
    /// Detection-confidence estimate in `[0, 1]`.
    pub score: f64,
}

impl Keypoint {
    /// Whether this keypoint clears the rendering confidence cutoff.
    ///
    /// Confidence gates rendering only; the repetition detector
    /// deliberately does not check scores.
    pub fn is_confident(&self, min_score: f64) -> bool {
        self.score > min_score
    }
}

/// The set of keypoints detected for one person in one frame.
///
/// At most one keypoint per joint is expected; if the source reports
/// duplicates, lookups return the first match (the source's contract).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pose {
    keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Look up a joint by name, first match wins.
    pub fn get(&self, name: JointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

impl From<Vec<Keypoint>> for Pose {
    fn from(keypoints: Vec<Keypoint>) -> Self {
        Self::new(keypoints)
    }
}

// ============================================================================
// Repetition Types
// ============================================================================

/// Position within a push-up cycle.
///
/// A session starts in `Up`; a repetition completes on the Down -> Up
/// transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepState {
    #[default]
    Up,
    Down,
}

/// A completed repetition. Created only on a Down -> Up transition and
/// immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepCompletedEvent {
    pub timestamp: DateTime<Utc>,
}

impl RepCompletedEvent {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
        }
    }

    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }
}
