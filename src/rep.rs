//! Rep detection state machine
//!
//! DOWN → UP → HOLD → DOWN. Raising needs the wrist to clear the shoulder by
//! `up_thresh`, lowering only needs `down_thresh` below it, and the arm must
//! stay up for `hold_time` before the rep counts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::feedback::FeedbackCode;
use crate::geometry::{is_lowered_below, is_raised_above};
use crate::pose::{Arm, PoseSnapshot};
use crate::posture::PostureVerdict;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RepStage {
    #[default]
    Down,
    Up,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepEvent {
    RepCompleted,
}

/// Outcome of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepStep {
    pub stage: RepStage,
    pub event: Option<RepEvent>,
    pub feedback: Option<FeedbackCode>,
}

#[derive(Debug, Clone, Default)]
pub struct RepStateMachine {
    stage: RepStage,
    raise_time: Option<Duration>,
    thresholds: Thresholds,
}

impl RepStateMachine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            stage: RepStage::Down,
            raise_time: None,
            thresholds,
        }
    }

    pub fn stage(&self) -> RepStage {
        self.stage
    }

    pub fn raise_time(&self) -> Option<Duration> {
        self.raise_time
    }

    /// Back to DOWN, dropping any pending hold
    pub fn reset(&mut self) {
        if self.stage != RepStage::Down {
            log::debug!("rep stage reset from {}", self.stage);
        }
        self.stage = RepStage::Down;
        self.raise_time = None;
    }

    /// Shift a pending hold forward by time spent paused, so the pause
    /// neither counts toward the hold nor erases what was already held.
    pub fn freeze_for(&mut self, paused: Duration) {
        if let Some(raised) = self.raise_time {
            self.raise_time = Some(raised.saturating_add(paused));
        }
    }

    pub fn step(
        &mut self,
        pose: Option<&PoseSnapshot>,
        arm: Arm,
        now: Duration,
        verdict: &PostureVerdict,
    ) -> RepStep {
        if !verdict.is_ok() {
            return self.hold_stage(verdict.feedback());
        }
        let t = self.thresholds;
        let Some(joints) = pose.and_then(|p| p.arm(arm, t.min_visibility)) else {
            return self.hold_stage(Some(FeedbackCode::NoPose));
        };

        match self.stage {
            RepStage::Down => {
                if is_raised_above(joints.wrist, joints.shoulder, t.up_thresh) {
                    self.transition(RepStage::Up);
                    self.raise_time = Some(now);
                    self.hold_stage(Some(FeedbackCode::HoldAtTop))
                } else {
                    self.hold_stage(Some(FeedbackCode::RaiseHigher))
                }
            }
            RepStage::Up => {
                let raised = self.raise_time.unwrap_or(now);
                if now.saturating_sub(raised) >= t.hold_time() {
                    self.transition(RepStage::Hold);
                    self.raise_time = None;
                    RepStep {
                        stage: self.stage,
                        event: Some(RepEvent::RepCompleted),
                        feedback: Some(FeedbackCode::LowerSlowly),
                    }
                } else {
                    self.hold_stage(Some(FeedbackCode::HoldAtTop))
                }
            }
            RepStage::Hold => {
                if is_lowered_below(joints.wrist, joints.shoulder, t.down_thresh) {
                    self.transition(RepStage::Down);
                    self.hold_stage(Some(FeedbackCode::ReadyNextRep))
                } else {
                    self.hold_stage(Some(FeedbackCode::LowerFully))
                }
            }
        }
    }

    fn transition(&mut self, to: RepStage) {
        log::debug!("rep stage {} -> {}", self.stage, to);
        self.stage = to;
    }

    fn hold_stage(&self, feedback: Option<FeedbackCode>) -> RepStep {
        RepStep {
            stage: self.stage,
            event: None,
            feedback,
        }
    }
}
