//! Posture gate
//!
//! Ordered precondition checks run before a frame is trusted for rep
//! counting. The first failing check wins, which decides the single
//! corrective message the user sees.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::feedback::FeedbackCode;
use crate::geometry::{angle_at, is_raised_above};
use crate::pose::{Arm, PoseSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PostureFailure {
    /// No pose, a missing joint, or geometry that cannot be evaluated.
    /// Neutral: callers skip the frame.
    PoseUnavailable,
    ArmNotLifted,
    BadStance,
    ElbowNotExtended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostureVerdict {
    Ok,
    Failed(PostureFailure),
}

impl PostureVerdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, PostureVerdict::Ok)
    }

    /// Corrective feedback for a failed verdict
    pub fn feedback(&self) -> Option<FeedbackCode> {
        match self {
            PostureVerdict::Ok => None,
            PostureVerdict::Failed(PostureFailure::PoseUnavailable) => Some(FeedbackCode::NoPose),
            PostureVerdict::Failed(PostureFailure::ArmNotLifted) => {
                Some(FeedbackCode::ArmNotLifted)
            }
            PostureVerdict::Failed(PostureFailure::BadStance) => Some(FeedbackCode::BadStance),
            PostureVerdict::Failed(PostureFailure::ElbowNotExtended) => {
                Some(FeedbackCode::ElbowNotExtended)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostureGate {
    thresholds: Thresholds,
}

impl PostureGate {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, pose: Option<&PoseSnapshot>, arm: Arm) -> PostureVerdict {
        let t = &self.thresholds;
        let Some(pose) = pose else {
            return PostureVerdict::Failed(PostureFailure::PoseUnavailable);
        };
        let other = arm.opposite();
        let (Some(active), Some(other_shoulder), Some(other_wrist)) = (
            pose.arm(arm, t.min_visibility),
            pose.visible(other.shoulder(), t.min_visibility),
            pose.visible(other.wrist(), t.min_visibility),
        ) else {
            return PostureVerdict::Failed(PostureFailure::PoseUnavailable);
        };

        // wrong arm raised
        if is_raised_above(other_wrist, other_shoulder, t.up_thresh) {
            return PostureVerdict::Failed(PostureFailure::ArmNotLifted);
        }

        if active.shoulder.y > t.stand_thresh {
            return PostureVerdict::Failed(PostureFailure::BadStance);
        }

        match angle_at(active.shoulder, active.elbow, active.wrist) {
            Ok(angle) if angle < t.elbow_angle_min => {
                PostureVerdict::Failed(PostureFailure::ElbowNotExtended)
            }
            Ok(_) => PostureVerdict::Ok,
            Err(e) => {
                log::debug!("elbow angle undetermined for {} arm: {}", arm, e);
                PostureVerdict::Failed(PostureFailure::PoseUnavailable)
            }
        }
    }
}
