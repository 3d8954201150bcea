//! Deterministic headless driving of a [`SessionController`]
//!
//! Uses each recorded `t_ms` as the clock, so a replay gives the same events
//! regardless of how fast it runs.

use std::time::Duration;

use serde::Serialize;

use crate::cues::{Cue, CueScheduler};
use crate::recording::{Command, RecordedFrame};
use crate::session::{
    ConfigError, SessionConfig, SessionController, SessionEvent, SessionStatus,
};

/// One line of headless output. A line without an event carries a repeated
/// reminder cue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub t_ms: u64,
    #[serde(flatten)]
    pub event: Option<SessionEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<Cue>,
}

/// Route a lifecycle command to the controller
pub fn apply_command(
    controller: &mut SessionController,
    command: Command,
    config: SessionConfig,
    now: Duration,
) -> Result<Vec<SessionEvent>, ConfigError> {
    let events = match command {
        Command::Start => controller.start(config)?,
        Command::Pause => controller.pause(now),
        Command::Resume => controller.resume(now),
        Command::TogglePause => controller.toggle_pause(now),
        Command::Stop => controller.stop(),
        Command::SetArm(arm) => controller.set_arm(arm),
    };
    Ok(events)
}

/// Start a session at the first frame and play every frame and command in
/// order.
pub fn replay(
    controller: &mut SessionController,
    config: SessionConfig,
    frames: &[RecordedFrame],
) -> Result<Vec<TimedEvent>, ConfigError> {
    let mut cues = CueScheduler::new();
    let mut out = vec![];

    let start_ms = frames.first().map_or(0, |f| f.t_ms);
    let started = controller.start(config)?;
    emit(&mut out, controller, &mut cues, start_ms, started);

    for frame in frames {
        let now = frame.at();
        let ticked = controller.tick(now);
        emit(&mut out, controller, &mut cues, frame.t_ms, ticked);

        let events = match frame.command {
            Some(command) => apply_command(controller, command, config, now)?,
            None => controller.process_frame(frame.pose.as_ref(), now),
        };
        emit(&mut out, controller, &mut cues, frame.t_ms, events);

        if frame.command.is_none() && controller.status() == SessionStatus::Running {
            let reminder = cues.reminder(controller.state().feedback, controller.arm(), now);
            out.extend(reminder.map(|cue| TimedEvent {
                t_ms: frame.t_ms,
                event: None,
                cues: vec![cue],
            }));
        }
    }
    log::debug!("replayed {} frames, {} events", frames.len(), out.len());
    Ok(out)
}

fn emit(
    out: &mut Vec<TimedEvent>,
    controller: &SessionController,
    cues: &mut CueScheduler,
    t_ms: u64,
    events: Vec<SessionEvent>,
) {
    let now = Duration::from_millis(t_ms);
    for event in events {
        out.push(TimedEvent {
            t_ms,
            cues: cues.cues_for(&event, controller.config(), controller.arm(), now),
            event: Some(event),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Arm, Joint, Landmark, PoseSnapshot};

    fn pose(wrist_y: f32) -> PoseSnapshot {
        PoseSnapshot::new()
            .with_joint(Joint::LeftShoulder, Landmark::new(0.6, 0.4))
            .with_joint(Joint::LeftElbow, Landmark::new(0.6, 0.55))
            .with_joint(Joint::LeftWrist, Landmark::new(0.6, 0.7))
            .with_joint(Joint::RightShoulder, Landmark::new(0.4, 0.4))
            .with_joint(Joint::RightElbow, Landmark::new(0.4, (0.4 + wrist_y) / 2.0))
            .with_joint(Joint::RightWrist, Landmark::new(0.4, wrist_y))
    }

    fn config(reps: u32, sets: u32, rest: u32) -> SessionConfig {
        SessionConfig {
            reps_per_set: reps,
            total_sets: sets,
            rest_seconds: rest,
        }
    }

    #[test]
    fn test_replay_counts_reps_with_cues() {
        let frames = vec![
            RecordedFrame::frame(0, Some(pose(0.7))),
            RecordedFrame::frame(100, Some(pose(0.2))),
            RecordedFrame::frame(1100, Some(pose(0.2))),
            RecordedFrame::frame(1200, Some(pose(0.7))),
        ];
        let mut controller = SessionController::default();
        let events = replay(&mut controller, config(1, 1, 0), &frames).unwrap();

        assert_eq!(events[0].event, Some(SessionEvent::SessionStarted));
        assert_eq!(events[0].t_ms, 0);
        let rep = events
            .iter()
            .find(|e| matches!(e.event, Some(SessionEvent::RepCompleted { .. })))
            .unwrap();
        assert_eq!(rep.t_ms, 1100);
        assert_eq!(rep.cues[0], Cue::Speak("1".into()));
        assert_eq!(controller.status(), SessionStatus::Complete);
    }

    #[test]
    fn test_replay_applies_commands() {
        let frames = vec![
            RecordedFrame::frame(0, Some(pose(0.2))),
            RecordedFrame::command(100, Command::SetArm(Arm::Left)),
            RecordedFrame::command(200, Command::Pause),
            RecordedFrame::frame(1500, Some(pose(0.2))),
        ];
        let mut controller = SessionController::default();
        let events = replay(&mut controller, config(3, 1, 0), &frames).unwrap();
        let kinds: Vec<_> = events.iter().filter_map(|e| e.event).collect();

        assert!(kinds.contains(&SessionEvent::ArmChanged { arm: Arm::Left }));
        assert!(kinds.contains(&SessionEvent::Paused));
        assert_eq!(controller.status(), SessionStatus::Paused);
        assert_eq!(controller.arm(), Arm::Left);
    }

    #[test]
    fn test_replay_rejects_invalid_config() {
        let mut controller = SessionController::default();
        assert_eq!(
            replay(&mut controller, config(0, 1, 0), &[]),
            Err(ConfigError::ZeroReps)
        );
    }

    #[test]
    fn test_timed_event_json_is_flat() {
        let event = TimedEvent {
            t_ms: 42,
            event: Some(SessionEvent::SetCompleted { set_number: 1 }),
            cues: vec![],
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"t_ms":42,"event":"set_completed","set_number":1}"#
        );
    }

    #[test]
    fn test_wrong_arm_reminder_repeats_while_raised() {
        // left arm raised while exercising the right one
        let wrong = PoseSnapshot::new()
            .with_joint(Joint::LeftShoulder, Landmark::new(0.6, 0.4))
            .with_joint(Joint::LeftElbow, Landmark::new(0.6, 0.3))
            .with_joint(Joint::LeftWrist, Landmark::new(0.6, 0.2))
            .with_joint(Joint::RightShoulder, Landmark::new(0.4, 0.4))
            .with_joint(Joint::RightElbow, Landmark::new(0.4, 0.55))
            .with_joint(Joint::RightWrist, Landmark::new(0.4, 0.7));
        let frames: Vec<_> = (0..=10)
            .map(|s| RecordedFrame::frame(s * 1000, Some(wrong.clone())))
            .collect();
        let mut controller = SessionController::default();
        let events = replay(&mut controller, config(3, 1, 0), &frames).unwrap();

        let spoken: Vec<u64> = events
            .iter()
            .filter(|e| {
                e.cues
                    .iter()
                    .any(|c| matches!(c, Cue::Speak(w) if w.contains("lift")))
            })
            .map(|e| e.t_ms)
            .collect();
        assert_eq!(spoken, vec![0, 3000, 6000, 9000]);
        // only the first one rides on a feedback event
        assert_eq!(events.iter().filter(|e| e.event.is_none()).count(), 3);
    }

    #[test]
    fn test_reminder_line_has_no_event_key() {
        let line = TimedEvent {
            t_ms: 7,
            event: None,
            cues: vec![Cue::Speak("Please lift your right arm".into())],
        };
        assert_eq!(
            serde_json::to_string(&line).unwrap(),
            r#"{"t_ms":7,"cues":[{"cue":"speak","value":"Please lift your right arm"}]}"#
        );
    }
}
