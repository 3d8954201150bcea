use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Thresholds;
use crate::feedback::FeedbackCode;
use crate::pose::{Arm, PoseSnapshot};
use crate::posture::PostureGate;
use crate::rep::{RepEvent, RepStage, RepStateMachine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub reps_per_set: u32,
    pub total_sets: u32,
    pub rest_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("reps per set must be at least 1")]
    ZeroReps,
    #[error("total sets must be at least 1")]
    ZeroSets,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reps_per_set == 0 {
            return Err(ConfigError::ZeroReps);
        }
        if self.total_sets == 0 {
            return Err(ConfigError::ZeroSets);
        }
        Ok(())
    }

    pub fn rest(&self) -> Duration {
        Duration::from_secs(self.rest_seconds as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Resting,
    Complete,
}

/// Output consumed by rendering and audio collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted,
    Feedback { code: FeedbackCode },
    RepCompleted { reps_in_set: u32, set_number: u32 },
    SetCompleted { set_number: u32 },
    RestStarted { rest_seconds: u32, next_set: u32 },
    RestTick { seconds_remaining: u64 },
    RestFinished { set_number: u32 },
    SessionCompleted,
    Paused,
    Resumed,
    Stopped,
    ArmChanged { arm: Arm },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_set: u32,
    pub reps_in_set: u32,
    pub status: SessionStatus,
    /// Absolute deadline of the running rest interval
    pub rest_end: Option<Duration>,
    pub paused_at: Option<Duration>,
    /// Latest feedback shown to the user
    pub feedback: Option<FeedbackCode>,
    last_rest_tick: Option<u64>,
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Running | SessionStatus::Paused | SessionStatus::Resting
        )
    }

    pub fn is_paused(&self) -> bool {
        self.status == SessionStatus::Paused
    }

    pub fn in_rest(&self) -> bool {
        self.status == SessionStatus::Resting
    }

    /// Whole seconds left in the rest interval, rounded up
    pub fn rest_remaining_secs(&self, now: Duration) -> Option<u64> {
        if !self.in_rest() {
            return None;
        }
        let left = self.rest_end?.saturating_sub(now);
        Some(left.as_millis().div_ceil(1000) as u64)
    }
}

/// Owns the session counters, the posture gate and the rep state machine.
/// Time-dependent operations take the caller's monotonic `now`.
#[derive(Debug, Clone)]
pub struct SessionController {
    config: Option<SessionConfig>,
    state: SessionState,
    gate: PostureGate,
    reps: RepStateMachine,
    arm: Arm,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(Thresholds::default(), Arm::default())
    }
}

impl SessionController {
    pub fn new(thresholds: Thresholds, arm: Arm) -> Self {
        Self {
            config: None,
            state: SessionState::default(),
            gate: PostureGate::new(thresholds),
            reps: RepStateMachine::new(thresholds),
            arm,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn arm(&self) -> Arm {
        self.arm
    }

    pub fn stage(&self) -> RepStage {
        self.reps.stage()
    }

    pub fn start(&mut self, config: SessionConfig) -> Result<Vec<SessionEvent>, ConfigError> {
        config.validate()?;
        if self.state.is_running() {
            log::warn!("start ignored: session already {}", self.state.status);
            return Ok(vec![]);
        }

        log::info!(
            "starting session: {} sets of {} reps, {}s rest, {} arm",
            config.total_sets,
            config.reps_per_set,
            config.rest_seconds,
            self.arm
        );
        self.config = Some(config);
        self.state = SessionState {
            current_set: 1,
            status: SessionStatus::Running,
            ..SessionState::default()
        };
        self.reps.reset();
        Ok(vec![SessionEvent::SessionStarted])
    }

    pub fn pause(&mut self, now: Duration) -> Vec<SessionEvent> {
        if self.state.status != SessionStatus::Running {
            log::debug!("pause ignored while {}", self.state.status);
            return vec![];
        }
        self.state.status = SessionStatus::Paused;
        self.state.paused_at = Some(now);
        log::info!("session paused");
        vec![SessionEvent::Paused]
    }

    pub fn resume(&mut self, now: Duration) -> Vec<SessionEvent> {
        if self.state.status != SessionStatus::Paused {
            log::debug!("resume ignored while {}", self.state.status);
            return vec![];
        }
        if let Some(paused_at) = self.state.paused_at.take() {
            self.reps.freeze_for(now.saturating_sub(paused_at));
        }
        self.state.status = SessionStatus::Running;
        log::info!("session resumed");
        vec![SessionEvent::Resumed]
    }

    /// Pause when running, resume when paused
    pub fn toggle_pause(&mut self, now: Duration) -> Vec<SessionEvent> {
        match self.state.status {
            SessionStatus::Paused => self.resume(now),
            _ => self.pause(now),
        }
    }

    pub fn stop(&mut self) -> Vec<SessionEvent> {
        if self.state.status == SessionStatus::Idle {
            return vec![];
        }
        self.state = SessionState::default();
        self.reps.reset();
        log::info!("session stopped");
        vec![SessionEvent::Stopped]
    }

    pub fn set_arm(&mut self, arm: Arm) -> Vec<SessionEvent> {
        if arm == self.arm {
            return vec![];
        }
        log::info!("arm switched {} -> {}", self.arm, arm);
        self.arm = arm;
        self.reps.reset();
        vec![SessionEvent::ArmChanged { arm }]
    }

    /// Advance the rest countdown. Only meaningful while resting.
    pub fn tick(&mut self, now: Duration) -> Vec<SessionEvent> {
        if !self.state.in_rest() {
            return vec![];
        }
        let rest_end = self.state.rest_end.unwrap_or(now);
        if now >= rest_end {
            self.state.status = SessionStatus::Running;
            self.state.rest_end = None;
            self.state.last_rest_tick = None;
            log::info!("rest over, starting set {}", self.state.current_set);
            return vec![SessionEvent::RestFinished {
                set_number: self.state.current_set,
            }];
        }

        let remaining = self.state.rest_remaining_secs(now).unwrap_or(0);
        if self.state.last_rest_tick == Some(remaining) {
            return vec![];
        }
        self.state.last_rest_tick = Some(remaining);
        vec![SessionEvent::RestTick {
            seconds_remaining: remaining,
        }]
    }

    /// Feed one frame through the posture gate and the rep state machine
    pub fn process_frame(
        &mut self,
        pose: Option<&PoseSnapshot>,
        now: Duration,
    ) -> Vec<SessionEvent> {
        let mut events = vec![];
        match self.state.status {
            SessionStatus::Idle | SessionStatus::Paused | SessionStatus::Complete => {
                return events
            }
            SessionStatus::Resting => {
                events.extend(self.tick(now));
                if self.state.in_rest() {
                    return events;
                }
            }
            SessionStatus::Running => {}
        }

        let verdict = self.gate.evaluate(pose, self.arm);
        let step = self.reps.step(pose, self.arm, now, &verdict);

        if step.feedback.is_some() && step.feedback != self.state.feedback {
            self.state.feedback = step.feedback;
            if let Some(code) = step.feedback {
                events.push(SessionEvent::Feedback { code });
            }
        }

        if step.event == Some(RepEvent::RepCompleted) {
            events.extend(self.on_rep_completed(now));
        }
        events
    }

    pub fn on_rep_completed(&mut self, now: Duration) -> Vec<SessionEvent> {
        let Some(config) = self.config else {
            return vec![];
        };
        if self.state.status != SessionStatus::Running {
            log::debug!("rep ignored while {}", self.state.status);
            return vec![];
        }

        self.state.reps_in_set += 1;
        let set_number = self.state.current_set;
        let mut events = vec![SessionEvent::RepCompleted {
            reps_in_set: self.state.reps_in_set,
            set_number,
        }];
        log::info!(
            "rep {}/{} of set {}",
            self.state.reps_in_set,
            config.reps_per_set,
            set_number
        );

        if self.state.reps_in_set < config.reps_per_set {
            return events;
        }

        events.push(SessionEvent::SetCompleted { set_number });
        if set_number < config.total_sets {
            self.state.status = SessionStatus::Resting;
            self.state.rest_end = Some(now + config.rest());
            self.state.last_rest_tick = None;
            self.state.current_set += 1;
            self.state.reps_in_set = 0;
            log::info!(
                "set {} complete, resting {}s",
                set_number,
                config.rest_seconds
            );
            events.push(SessionEvent::RestStarted {
                rest_seconds: config.rest_seconds,
                next_set: self.state.current_set,
            });
        } else {
            self.state.status = SessionStatus::Complete;
            log::info!("session complete after {} sets", config.total_sets);
            events.push(SessionEvent::SessionCompleted);
        }
        events
    }
}
