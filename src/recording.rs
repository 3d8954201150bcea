//! Pose recordings
//!
//! JSON Lines, one entry per frame:
//!
//! ```text
//! {"t_ms": 0, "pose": {"right_shoulder": {"x": 0.4, "y": 0.4}, ...}}
//! {"t_ms": 33, "pose": null}
//! {"t_ms": 40, "command": "pause"}
//! {"t_ms": 90, "command": {"set_arm": "left"}}
//! ```
//!
//! A line carrying a `command` is a lifecycle command, anything else is a
//! frame (a missing or null `pose` means nothing was detected).

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pose::{Arm, PoseSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    Resume,
    TogglePause,
    Stop,
    SetArm(Arm),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub t_ms: u64,
    #[serde(default)]
    pub pose: Option<PoseSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
}

impl RecordedFrame {
    pub fn frame(t_ms: u64, pose: Option<PoseSnapshot>) -> Self {
        Self {
            t_ms,
            pose,
            command: None,
        }
    }

    pub fn command(t_ms: u64, command: Command) -> Self {
        Self {
            t_ms,
            pose: None,
            command: Some(command),
        }
    }

    pub fn at(&self) -> Duration {
        Duration::from_millis(self.t_ms)
    }
}

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("failed to read recording: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: timestamp {t_ms}ms goes backwards")]
    OutOfOrder { line: usize, t_ms: u64 },
}

pub fn parse<R: BufRead>(reader: R) -> Result<Vec<RecordedFrame>, RecordingError> {
    let mut frames: Vec<RecordedFrame> = vec![];
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: RecordedFrame =
            serde_json::from_str(&line).map_err(|source| RecordingError::Parse {
                line: idx + 1,
                source,
            })?;
        if frames.last().is_some_and(|prev| frame.t_ms < prev.t_ms) {
            return Err(RecordingError::OutOfOrder {
                line: idx + 1,
                t_ms: frame.t_ms,
            });
        }
        frames.push(frame);
    }
    Ok(frames)
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<RecordedFrame>, RecordingError> {
    let file = File::open(path)?;
    parse(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Joint, Landmark};
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_frames_and_commands() {
        let input = r#"{"t_ms": 0, "pose": {"right_wrist": {"x": 0.4, "y": 0.2}}}
{"t_ms": 33, "pose": null}

{"t_ms": 40}
{"t_ms": 50, "command": "pause"}
{"t_ms": 90, "command": {"set_arm": "left"}}
"#;
        let frames = parse(input.as_bytes()).unwrap();

        assert_eq!(frames.len(), 5);
        assert_eq!(
            frames[0].pose.as_ref().and_then(|p| p.get(Joint::RightWrist)),
            Some(Landmark::new(0.4, 0.2))
        );
        assert_eq!(frames[1], RecordedFrame::frame(33, None));
        assert_eq!(frames[2], RecordedFrame::frame(40, None));
        assert_eq!(frames[3], RecordedFrame::command(50, Command::Pause));
        assert_eq!(frames[4].command, Some(Command::SetArm(Arm::Left)));
        assert_eq!(frames[4].at(), Duration::from_millis(90));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let input = "{\"t_ms\": 0}\n{\"t_ms\": \"soon\"}\n";
        let err = parse(input.as_bytes()).unwrap_err();
        assert_matches!(err, RecordingError::Parse { line: 2, .. });
    }

    #[test]
    fn test_backwards_timestamps_rejected() {
        let input = "{\"t_ms\": 100}\n{\"t_ms\": 50}\n";
        assert_matches!(
            parse(input.as_bytes()),
            Err(RecordingError::OutOfOrder { line: 2, t_ms: 50 })
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(load(dir.path().join("nope.jsonl")), Err(RecordingError::Io(_)));
    }

    #[test]
    fn test_command_serialization() {
        let frame = RecordedFrame::command(5, Command::SetArm(Arm::Right));
        let line = serde_json::to_string(&frame).unwrap();
        assert_eq!(line, r#"{"t_ms":5,"pose":null,"command":{"set_arm":"right"}}"#);
    }
}
