use serde::{Deserialize, Serialize};

use crate::pose::Arm;

/// Corrective or progress hint shown to the user for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackCode {
    ArmNotLifted,
    BadStance,
    ElbowNotExtended,
    RaiseHigher,
    HoldAtTop,
    LowerSlowly,
    LowerFully,
    ReadyNextRep,
    /// Neutral: no usable pose this frame
    NoPose,
}

impl FeedbackCode {
    pub fn message(&self, arm: Arm) -> String {
        match self {
            FeedbackCode::ArmNotLifted => format!("Please lift your {} arm", arm),
            FeedbackCode::BadStance => "Please stand up straight".to_string(),
            FeedbackCode::ElbowNotExtended => "Extend your arm fully".to_string(),
            FeedbackCode::RaiseHigher => "Raise your arm higher".to_string(),
            FeedbackCode::HoldAtTop => "Hold at top...".to_string(),
            FeedbackCode::LowerSlowly => "Lower your arm slowly".to_string(),
            FeedbackCode::LowerFully => "Lower fully".to_string(),
            FeedbackCode::ReadyNextRep => "Ready for next rep".to_string(),
            FeedbackCode::NoPose => "No pose detected".to_string(),
        }
    }

    /// Posture corrections, as opposed to progress hints
    pub fn is_correction(&self) -> bool {
        matches!(
            self,
            FeedbackCode::ArmNotLifted | FeedbackCode::BadStance | FeedbackCode::ElbowNotExtended
        )
    }
}
