//! Voice and tone cues
//!
//! Turns session events into what an audio collaborator should say or play.
//! Nothing here performs I/O.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackCode;
use crate::pose::Arm;
use crate::session::{SessionConfig, SessionEvent};

/// Minimum gap between repeated wrong-arm reminders
pub const WRONG_ARM_REPEAT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    RepClang,
    RestStart,
    RestOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cue", content = "value", rename_all = "snake_case")]
pub enum Cue {
    Speak(String),
    Tone(Tone),
}

#[derive(Debug, Clone, Default)]
pub struct CueScheduler {
    last_wrong_arm: Option<Duration>,
}

impl CueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues_for(
        &mut self,
        event: &SessionEvent,
        config: Option<&SessionConfig>,
        arm: Arm,
        now: Duration,
    ) -> Vec<Cue> {
        match *event {
            SessionEvent::SessionStarted => config
                .map(|c| {
                    vec![Cue::Speak(format!(
                        "Starting session: {} sets of {} reps",
                        c.total_sets, c.reps_per_set
                    ))]
                })
                .unwrap_or_default(),
            SessionEvent::RepCompleted { reps_in_set, .. } => vec![
                Cue::Speak(reps_in_set.to_string()),
                Cue::Tone(Tone::RepClang),
            ],
            SessionEvent::RestStarted {
                rest_seconds,
                next_set,
            } => vec![
                Cue::Tone(Tone::RestStart),
                Cue::Speak(format!(
                    "Set {} complete. Rest for {} seconds.",
                    next_set.saturating_sub(1),
                    rest_seconds
                )),
            ],
            SessionEvent::RestFinished { set_number } => vec![
                Cue::Tone(Tone::RestOver),
                Cue::Speak(format!("Rest over. Starting set {}", set_number)),
            ],
            SessionEvent::SessionCompleted => {
                vec![Cue::Speak("Session complete. Great job!".to_string())]
            }
            SessionEvent::Paused => vec![Cue::Speak("Paused".to_string())],
            SessionEvent::Resumed => vec![Cue::Speak("Resumed".to_string())],
            SessionEvent::Stopped => {
                self.last_wrong_arm = None;
                vec![Cue::Speak("Session stopped".to_string())]
            }
            SessionEvent::Feedback { code } => {
                self.reminder(Some(code), arm, now).into_iter().collect()
            }
            SessionEvent::SetCompleted { .. }
            | SessionEvent::RestTick { .. }
            | SessionEvent::ArmChanged { .. } => vec![],
        }
    }

    /// Repeat the wrong-arm prompt while it stays the current feedback,
    /// at most once per [`WRONG_ARM_REPEAT`].
    pub fn reminder(
        &mut self,
        feedback: Option<FeedbackCode>,
        arm: Arm,
        now: Duration,
    ) -> Option<Cue> {
        if feedback != Some(FeedbackCode::ArmNotLifted) {
            return None;
        }
        let due = self
            .last_wrong_arm
            .map_or(true, |last| now.saturating_sub(last) > WRONG_ARM_REPEAT);
        if !due {
            return None;
        }
        self.last_wrong_arm = Some(now);
        Some(Cue::Speak(FeedbackCode::ArmNotLifted.message(arm)))
    }
}
