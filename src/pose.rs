//! Pose snapshot types
//!
//! One frame's worth of named joint positions as produced by an external pose
//! estimator (MediaPipe Pose layout). Coordinates are normalized to `[0, 1]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of landmarks in a full MediaPipe Pose frame
pub const MEDIAPIPE_LANDMARKS: usize = 33;

/// A single 2D landmark (normalized coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    pub fn with_visibility(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            visibility: Some(visibility),
        }
    }

    /// Landmarks without a visibility score are trusted
    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.visibility.map_or(true, |v| v >= min_visibility)
    }
}

/// Joints the rep counter reads
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
}

impl Joint {
    pub const ALL: [Joint; 6] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
    ];

    /// MediaPipe Pose landmark index
    pub fn index(self) -> usize {
        match self {
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
        }
    }
}

/// Which arm is being exercised
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Arm {
    Left,
    #[default]
    Right,
}

impl Arm {
    pub fn opposite(self) -> Arm {
        match self {
            Arm::Left => Arm::Right,
            Arm::Right => Arm::Left,
        }
    }

    pub fn shoulder(self) -> Joint {
        match self {
            Arm::Left => Joint::LeftShoulder,
            Arm::Right => Joint::RightShoulder,
        }
    }

    pub fn elbow(self) -> Joint {
        match self {
            Arm::Left => Joint::LeftElbow,
            Arm::Right => Joint::RightElbow,
        }
    }

    pub fn wrist(self) -> Joint {
        match self {
            Arm::Left => Joint::LeftWrist,
            Arm::Right => Joint::RightWrist,
        }
    }
}

/// Shoulder, elbow and wrist of one arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmJoints {
    pub shoulder: Landmark,
    pub elbow: Landmark,
    pub wrist: Landmark,
}

/// Joint positions for one frame. The core never mutates a snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseSnapshot {
    joints: BTreeMap<Joint, Landmark>,
}

impl PoseSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_joint(mut self, joint: Joint, landmark: Landmark) -> Self {
        self.joints.insert(joint, landmark);
        self
    }

    pub fn insert(&mut self, joint: Joint, landmark: Landmark) {
        self.joints.insert(joint, landmark);
    }

    /// Build from a full MediaPipe landmark array. Returns `None` for a
    /// wrongly sized frame.
    pub fn from_mediapipe(landmarks: &[Landmark]) -> Option<Self> {
        if landmarks.len() != MEDIAPIPE_LANDMARKS {
            return None;
        }
        let joints = Joint::ALL
            .iter()
            .map(|&joint| (joint, landmarks[joint.index()]))
            .collect();
        Some(Self { joints })
    }

    pub fn get(&self, joint: Joint) -> Option<Landmark> {
        self.joints.get(&joint).copied()
    }

    /// Joint position if present and visible enough to trust
    pub fn visible(&self, joint: Joint, min_visibility: f32) -> Option<Landmark> {
        self.get(joint).filter(|lm| lm.is_visible(min_visibility))
    }

    pub fn arm(&self, arm: Arm, min_visibility: f32) -> Option<ArmJoints> {
        Some(ArmJoints {
            shoulder: self.visible(arm.shoulder(), min_visibility)?,
            elbow: self.visible(arm.elbow(), min_visibility)?,
            wrist: self.visible(arm.wrist(), min_visibility)?,
        })
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
