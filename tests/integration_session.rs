// End-to-end sessions through the recording parser and the deterministic
// replay driver.

use std::io::Cursor;

use repcue::{
    cues::Cue,
    feedback::FeedbackCode,
    recording::{self, Command, RecordedFrame},
    replay::{replay, TimedEvent},
    Arm, Joint, Landmark, PoseSnapshot, SessionConfig, SessionController, SessionEvent,
    SessionStatus,
};

/// Both arms present; `right_y`/`left_y` are wrist heights, shoulders at 0.4
fn pose(right_y: f32, left_y: f32) -> PoseSnapshot {
    PoseSnapshot::new()
        .with_joint(Joint::LeftShoulder, Landmark::new(0.6, 0.4))
        .with_joint(Joint::LeftElbow, Landmark::new(0.6, (0.4 + left_y) / 2.0))
        .with_joint(Joint::LeftWrist, Landmark::new(0.6, left_y))
        .with_joint(Joint::RightShoulder, Landmark::new(0.4, 0.4))
        .with_joint(Joint::RightElbow, Landmark::new(0.4, (0.4 + right_y) / 2.0))
        .with_joint(Joint::RightWrist, Landmark::new(0.4, right_y))
}

fn right(wrist_y: f32) -> Option<PoseSnapshot> {
    Some(pose(wrist_y, 0.7))
}

fn rep_frames(t: &mut u64, frames: &mut Vec<RecordedFrame>) {
    for wrist_y in [0.7, 0.2, 0.2, 0.7] {
        frames.push(RecordedFrame::frame(*t, right(wrist_y)));
        *t += 600;
    }
}

fn cfg(reps: u32, sets: u32, rest: u32) -> SessionConfig {
    SessionConfig {
        reps_per_set: reps,
        total_sets: sets,
        rest_seconds: rest,
    }
}

fn run(config: SessionConfig, frames: &[RecordedFrame]) -> (SessionController, Vec<TimedEvent>) {
    let mut controller = SessionController::default();
    let events = replay(&mut controller, config, frames).unwrap();
    (controller, events)
}

fn session_events(events: &[TimedEvent]) -> Vec<SessionEvent> {
    events
        .iter()
        .filter_map(|e| e.event)
        .filter(|e| !matches!(e, SessionEvent::Feedback { .. } | SessionEvent::RestTick { .. }))
        .collect()
}

#[test]
fn three_sets_of_two_with_rest() {
    let mut frames = vec![];
    let mut t = 0;
    for set in 0..3 {
        if set > 0 {
            // idle through a 1s rest
            for _ in 0..3 {
                frames.push(RecordedFrame::frame(t, right(0.7)));
                t += 500;
            }
        }
        rep_frames(&mut t, &mut frames);
        rep_frames(&mut t, &mut frames);
    }

    let (controller, events) = run(cfg(2, 3, 1), &frames);
    assert_eq!(controller.status(), SessionStatus::Complete);

    let rep = |r, s| SessionEvent::RepCompleted {
        reps_in_set: r,
        set_number: s,
    };
    assert_eq!(
        session_events(&events),
        vec![
            SessionEvent::SessionStarted,
            rep(1, 1),
            rep(2, 1),
            SessionEvent::SetCompleted { set_number: 1 },
            SessionEvent::RestStarted {
                rest_seconds: 1,
                next_set: 2
            },
            SessionEvent::RestFinished { set_number: 2 },
            rep(1, 2),
            rep(2, 2),
            SessionEvent::SetCompleted { set_number: 2 },
            SessionEvent::RestStarted {
                rest_seconds: 1,
                next_set: 3
            },
            SessionEvent::RestFinished { set_number: 3 },
            rep(1, 3),
            rep(2, 3),
            SessionEvent::SetCompleted { set_number: 3 },
            SessionEvent::SessionCompleted,
        ]
    );
}

#[test]
fn pause_mid_hold_from_jsonl() {
    let lines = [
        RecordedFrame::frame(0, right(0.2)),
        RecordedFrame::frame(400, right(0.2)),
        RecordedFrame::command(500, Command::Pause),
        // frames while paused are dropped
        RecordedFrame::frame(3000, right(0.2)),
        RecordedFrame::command(5500, Command::Resume),
        RecordedFrame::frame(5900, right(0.2)),
        RecordedFrame::frame(6000, right(0.2)),
    ];
    let text: String = lines
        .iter()
        .map(|f| serde_json::to_string(f).unwrap() + "\n")
        .collect();
    let frames = recording::parse(Cursor::new(text)).unwrap();

    let (controller, events) = run(cfg(5, 1, 0), &frames);
    let reps: Vec<u64> = events
        .iter()
        .filter(|e| matches!(e.event, Some(SessionEvent::RepCompleted { .. })))
        .map(|e| e.t_ms)
        .collect();
    // 500ms held before the pause plus 500ms after resuming
    assert_eq!(reps, vec![6000]);
    assert_eq!(controller.state().reps_in_set, 1);
}

#[test]
fn switching_arm_mid_rep_discards_it() {
    let frames = vec![
        RecordedFrame::frame(0, right(0.2)),
        RecordedFrame::frame(800, right(0.2)),
        RecordedFrame::command(900, Command::SetArm(Arm::Left)),
        // right arm still up counts as lifting the wrong arm now
        RecordedFrame::frame(1200, right(0.2)),
        RecordedFrame::frame(1300, Some(pose(0.7, 0.2))),
        RecordedFrame::frame(2300, Some(pose(0.7, 0.2))),
    ];

    let (controller, events) = run(cfg(5, 1, 0), &frames);
    assert_eq!(controller.arm(), Arm::Left);

    let at = |t_ms| -> Vec<SessionEvent> {
        events
            .iter()
            .filter(|e| e.t_ms == t_ms)
            .filter_map(|e| e.event)
            .collect()
    };
    assert_eq!(at(900), vec![SessionEvent::ArmChanged { arm: Arm::Left }]);
    assert_eq!(
        at(1200),
        vec![SessionEvent::Feedback {
            code: FeedbackCode::ArmNotLifted
        }]
    );
    assert!(at(2300).contains(&SessionEvent::RepCompleted {
        reps_in_set: 1,
        set_number: 1
    }));
}

#[test]
fn wrong_arm_reminder_repeats_while_it_stays_up() {
    // left arm up for 10s while the right arm is selected
    let frames: Vec<_> = (0..=10)
        .map(|s| RecordedFrame::frame(s * 1000, Some(pose(0.7, 0.2))))
        .collect();
    let (_, events) = run(cfg(5, 1, 0), &frames);

    let feedback: Vec<_> = events
        .iter()
        .filter(|e| {
            e.event
                == Some(SessionEvent::Feedback {
                    code: FeedbackCode::ArmNotLifted,
                })
        })
        .collect();
    assert_eq!(feedback.len(), 1);

    let reminders: Vec<&TimedEvent> = events
        .iter()
        .filter(|e| {
            e.cues
                .iter()
                .any(|c| matches!(c, Cue::Speak(words) if words.contains("right")))
        })
        .collect();
    assert!(reminders.len() >= 4, "only {} reminders", reminders.len());
    for pair in reminders.windows(2) {
        assert!(pair[1].t_ms - pair[0].t_ms > 2000);
    }
}

#[test]
fn no_reminder_while_paused() {
    let mut frames = vec![
        RecordedFrame::frame(0, Some(pose(0.7, 0.2))),
        RecordedFrame::command(100, Command::Pause),
    ];
    frames.extend((1..=6).map(|s| RecordedFrame::frame(s * 1000, Some(pose(0.7, 0.2)))));
    let (_, events) = run(cfg(5, 1, 0), &frames);

    assert!(events.iter().all(|e| e.t_ms <= 100));
}

#[test]
fn dropped_pose_never_counts() {
    let frames = vec![
        RecordedFrame::frame(0, right(0.2)),
        RecordedFrame::frame(500, None),
        RecordedFrame::frame(1500, None),
        RecordedFrame::frame(2500, None),
    ];
    let (controller, events) = run(cfg(5, 1, 0), &frames);
    assert_eq!(controller.state().reps_in_set, 0);
    assert!(events.iter().any(|e| e.event
        == Some(SessionEvent::Feedback {
            code: FeedbackCode::NoPose
        })));
}
