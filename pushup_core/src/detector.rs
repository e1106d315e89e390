//! The repetition-detection state machine.
//!
//! A two-state machine (Up/Down) with hysteresis: the "down" and "up"
//! entry conditions use different angle thresholds so that frames
//! hovering near a single boundary value cannot double-count.

use crate::{angle_degrees, Config, JointName, Pose, RepCompletedEvent, RepState};

/// Detects completed push-up repetitions from a per-frame pose stream.
///
/// Owns the current [`RepState`] and the session repetition counter.
/// `process_frame` must be called in frame arrival order from a single
/// caller; it is the single source of truth for the state.
#[derive(Debug)]
pub struct RepDetector {
    state: RepState,
    count: u64,
    /// Both shoulder->elbow angles below this enter `Down` (degrees).
    down_threshold: f64,
    /// Both shoulder->elbow angles above this enter `Up` (degrees).
    up_threshold: f64,
}

impl RepDetector {
    /// Create a detector with explicit angle thresholds.
    ///
    /// The gap between the thresholds is the hysteresis dead zone; frames
    /// whose angles fall inside it never cause a transition.
    pub fn new(down_threshold: f64, up_threshold: f64) -> Self {
        Self {
            state: RepState::default(),
            count: 0,
            down_threshold,
            up_threshold,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.detector.down_threshold_degrees,
            config.detector.up_threshold_degrees,
        )
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Seed the counter, typically from persisted history at session start.
    pub fn set_count(&mut self, count: u64) {
        self.count = count;
    }

    /// Reset to the initial state with a zero counter.
    pub fn reset(&mut self) {
        self.state = RepState::default();
        self.count = 0;
    }

    /// Consume one frame; returns an event iff a repetition completed.
    ///
    /// Frames missing any of the four required joints are no-ops.
    /// Confidence scores are deliberately not checked here: angle gating
    /// is the only filter, matching the external source's behavior.
    /// NaN coordinates yield NaN angles, every threshold comparison is
    /// then false, and the frame degrades to "no transition".
    pub fn process_frame(&mut self, pose: &Pose) -> Option<RepCompletedEvent> {
        let left_shoulder = pose.get(JointName::LeftShoulder)?;
        let left_elbow = pose.get(JointName::LeftElbow)?;
        let right_shoulder = pose.get(JointName::RightShoulder)?;
        let right_elbow = pose.get(JointName::RightElbow)?;

        let left_angle = angle_degrees(left_shoulder, left_elbow);
        let right_angle = angle_degrees(right_shoulder, right_elbow);

        let is_down = left_angle < self.down_threshold && right_angle < self.down_threshold;
        let is_up = left_angle > self.up_threshold && right_angle > self.up_threshold;

        match self.state {
            RepState::Up if is_down => {
                tracing::debug!(left_angle, right_angle, "entering down position");
                self.state = RepState::Down;
                None
            }
            RepState::Down if is_up => {
                self.state = RepState::Up;
                self.count += 1;
                tracing::info!(count = self.count, "repetition completed");
                Some(RepCompletedEvent::now())
            }
            _ => None,
        }
    }
}
