//! The frame loop driving a counting session.
//!
//! One logical thread of control: each tick pulls a pose from the
//! source, feeds it to the detector, and on a completed repetition
//! appends to history and updates the counter display. Ticks never
//! overlap; a stop signal takes effect before the next tick.

use crate::{detector::RepDetector, HistoryStore, Pose, RepCompletedEvent, Result, StringStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Per-frame pose provider (camera + model, a recording, ...).
///
/// The loop issues at most one outstanding request at a time.
pub trait PoseSource {
    /// Produce the next pose. An empty pose means "no person detected"
    /// (a frame no-op); `Ok(None)` means the stream has ended.
    fn next_pose(&mut self) -> Result<Option<Pose>>;
}

/// Counter display seam; the UI renders the running total.
pub trait CounterDisplay {
    fn show_count(&mut self, count: u64);
}

/// A counting session: detector plus history, with the counter seeded
/// from persisted history so the displayed total spans sessions.
///
/// The session owns the repetition state exclusively; nothing else
/// mutates it.
pub struct Session<S: StringStore> {
    detector: RepDetector,
    history: HistoryStore<S>,
}

impl<S: StringStore> Session<S> {
    pub fn new(mut detector: RepDetector, history: HistoryStore<S>) -> Result<Self> {
        let recorded = history.count()?;
        detector.set_count(recorded);
        tracing::info!(recorded, "Session started");
        Ok(Self { detector, history })
    }

    /// Running total: persisted history plus repetitions this session.
    pub fn count(&self) -> u64 {
        self.detector.count()
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore<S> {
        &mut self.history
    }

    /// Process one frame.
    ///
    /// On a completed repetition the event is appended to history. A
    /// persistence failure surfaces as `Err`, but the counter has
    /// already advanced — the user-visible count is not lost within
    /// the session.
    pub fn tick(&mut self, pose: &Pose) -> Result<Option<RepCompletedEvent>> {
        let Some(event) = self.detector.process_frame(pose) else {
            return Ok(None);
        };

        self.history.append(&event)?;
        Ok(Some(event))
    }

    /// Drive the session until the source ends or `stop` is set.
    ///
    /// Frames are processed strictly in arrival order. No per-tick error
    /// terminates the loop: source failures skip the frame, persistence
    /// failures are logged and the count stays on screen. Returns the
    /// final running total.
    pub fn run<P, D>(
        &mut self,
        source: &mut P,
        display: &mut D,
        stop: &AtomicBool,
        tick_interval: Duration,
    ) -> u64
    where
        P: PoseSource,
        D: CounterDisplay,
    {
        display.show_count(self.count());

        while !stop.load(Ordering::Relaxed) {
            let pose = match source.next_pose() {
                Ok(Some(pose)) => pose,
                Ok(None) => {
                    tracing::info!("Pose stream ended");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Pose source failed, skipping frame: {}", e);
                    continue;
                }
            };

            match self.tick(&pose) {
                Ok(Some(_)) => display.show_count(self.count()),
                Ok(None) => {}
                Err(e) => {
                    // Counter already advanced; keep going on the next tick.
                    tracing::warn!("Failed to persist repetition: {}", e);
                    display.show_count(self.count());
                }
            }

            if !tick_interval.is_zero() {
                std::thread::sleep(tick_interval);
            }
        }

        self.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, FileStore, JointName, Keypoint};
    use std::collections::VecDeque;

    fn pose_with_angles(left: f64, right: f64) -> Pose {
        let arm = |shoulder: JointName, elbow: JointName, deg: f64| {
            let rad = deg.to_radians();
            [
                Keypoint {
                    name: shoulder,
                    x: 0.0,
                    y: 0.0,
                    score: 0.9,
                },
                Keypoint {
                    name: elbow,
                    x: rad.cos() * 50.0,
                    y: rad.sin() * 50.0,
                    score: 0.9,
                },
            ]
        };
        let [ls, le] = arm(JointName::LeftShoulder, JointName::LeftElbow, left);
        let [rs, re] = arm(JointName::RightShoulder, JointName::RightElbow, right);
        Pose::new(vec![ls, le, rs, re])
    }

    struct ScriptedSource {
        frames: VecDeque<Pose>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Pose>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    impl PoseSource for ScriptedSource {
        fn next_pose(&mut self) -> Result<Option<Pose>> {
            Ok(self.frames.pop_front())
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        shown: Vec<u64>,
    }

    impl CounterDisplay for RecordingDisplay {
        fn show_count(&mut self, count: u64) {
            self.shown.push(count);
        }
    }

    /// A backend that accepts nothing, for persistence-failure paths.
    struct BrokenStore;

    impl StringStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Persistence("backend offline".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            Err(Error::Persistence("backend offline".into()))
        }
    }

    fn file_session(dir: &std::path::Path) -> Session<FileStore> {
        Session::new(
            RepDetector::new(100.0, 160.0),
            HistoryStore::new(FileStore::new(dir)),
        )
        .unwrap()
    }

    fn one_rep() -> Vec<Pose> {
        vec![pose_with_angles(90.0, 90.0), pose_with_angles(170.0, 170.0)]
    }

    #[test]
    fn test_run_counts_and_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = file_session(temp_dir.path());

        let mut frames = one_rep();
        frames.extend(one_rep());
        let mut source = ScriptedSource::new(frames);
        let mut display = RecordingDisplay::default();
        let stop = AtomicBool::new(false);

        let total = session.run(&mut source, &mut display, &stop, Duration::ZERO);

        assert_eq!(total, 2);
        assert_eq!(session.history().count().unwrap(), 2);
        // Initial 0, then one update per completed rep
        assert_eq!(display.shown, vec![0, 1, 2]);
    }

    #[test]
    fn test_counter_seeds_from_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        {
            let mut session = file_session(temp_dir.path());
            let mut source = ScriptedSource::new(one_rep());
            let mut display = RecordingDisplay::default();
            session.run(
                &mut source,
                &mut display,
                &AtomicBool::new(false),
                Duration::ZERO,
            );
        }

        // New session picks up where the last one left off
        let mut session = file_session(temp_dir.path());
        assert_eq!(session.count(), 1);

        let mut source = ScriptedSource::new(one_rep());
        let mut display = RecordingDisplay::default();
        let total = session.run(
            &mut source,
            &mut display,
            &AtomicBool::new(false),
            Duration::ZERO,
        );
        assert_eq!(total, 2);
    }

    #[test]
    fn test_stop_flag_prevents_further_ticks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = file_session(temp_dir.path());

        let mut source = ScriptedSource::new(one_rep());
        let mut display = RecordingDisplay::default();
        let stop = AtomicBool::new(true);

        let total = session.run(&mut source, &mut display, &stop, Duration::ZERO);

        assert_eq!(total, 0);
        // Frames were never consumed
        assert_eq!(source.frames.len(), 2);
    }

    #[test]
    fn test_persistence_failure_keeps_session_count() {
        let mut session = Session::new(
            RepDetector::new(100.0, 160.0),
            HistoryStore::new(BrokenStore),
        )
        .unwrap();

        assert!(session.tick(&pose_with_angles(90.0, 90.0)).unwrap().is_none());
        let result = session.tick(&pose_with_angles(170.0, 170.0));

        assert!(matches!(result, Err(Error::Persistence(_))));
        // The user-visible count advanced despite the failed append
        assert_eq!(session.count(), 1);
    }

    #[test]
    fn test_run_survives_persistence_failure() {
        let mut session = Session::new(
            RepDetector::new(100.0, 160.0),
            HistoryStore::new(BrokenStore),
        )
        .unwrap();

        let mut frames = one_rep();
        frames.extend(one_rep());
        let mut source = ScriptedSource::new(frames);
        let mut display = RecordingDisplay::default();

        let total = session.run(
            &mut source,
            &mut display,
            &AtomicBool::new(false),
            Duration::ZERO,
        );

        // Both reps counted even though none could be persisted
        assert_eq!(total, 2);
        assert_eq!(display.shown, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_poses_are_no_ops() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = file_session(temp_dir.path());

        let mut source = ScriptedSource::new(vec![
            Pose::default(),
            pose_with_angles(90.0, 90.0),
            Pose::default(),
            pose_with_angles(170.0, 170.0),
        ]);
        let mut display = RecordingDisplay::default();

        let total = session.run(
            &mut source,
            &mut display,
            &AtomicBool::new(false),
            Duration::ZERO,
        );
        assert_eq!(total, 1);
    }
}
