//! Skeleton overlay helpers.
//!
//! The display layer draws keypoint dots and limb segments for keypoints
//! that clear the confidence cutoff. The gating lives here so rendering
//! glue stays mechanical; it never feeds back into repetition detection.

use crate::{JointName, Keypoint, Pose};

/// Adjacent joint pairs forming the drawable skeleton.
pub const SKELETON_EDGES: [(JointName, JointName); 19] = [
    (JointName::Nose, JointName::LeftEye),
    (JointName::Nose, JointName::RightEye),
    (JointName::Nose, JointName::LeftEar),
    (JointName::Nose, JointName::RightEar),
    (JointName::LeftEar, JointName::LeftEye),
    (JointName::RightEar, JointName::RightEye),
    (JointName::LeftEye, JointName::RightEye),
    (JointName::LeftShoulder, JointName::RightShoulder),
    (JointName::LeftShoulder, JointName::LeftElbow),
    (JointName::LeftShoulder, JointName::LeftHip),
    (JointName::RightShoulder, JointName::RightElbow),
    (JointName::RightShoulder, JointName::RightHip),
    (JointName::LeftElbow, JointName::LeftWrist),
    (JointName::RightElbow, JointName::RightWrist),
    (JointName::LeftHip, JointName::RightHip),
    (JointName::LeftHip, JointName::LeftKnee),
    (JointName::RightHip, JointName::RightKnee),
    (JointName::LeftKnee, JointName::LeftAnkle),
    (JointName::RightKnee, JointName::RightAnkle),
];

/// Keypoints that should be drawn: present and above the cutoff.
pub fn confident_keypoints(pose: &Pose, min_score: f64) -> Vec<&Keypoint> {
    pose.keypoints()
        .iter()
        .filter(|k| k.is_confident(min_score))
        .collect()
}

/// Skeleton segments that should be drawn: both endpoints present and
/// above the cutoff.
pub fn confident_segments(pose: &Pose, min_score: f64) -> Vec<(&Keypoint, &Keypoint)> {
    SKELETON_EDGES
        .iter()
        .filter_map(|&(from, to)| {
            let from = pose.get(from)?;
            let to = pose.get(to)?;
            (from.is_confident(min_score) && to.is_confident(min_score)).then_some((from, to))
        })
        .collect()
}
