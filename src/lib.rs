// Library surface for the binary, headless replays and integration tests.
// Rendering lives in the bin; the counting core performs no terminal or audio I/O.
pub mod config;
pub mod cues;
pub mod feedback;
pub mod geometry;
pub mod pose;
pub mod posture;
pub mod recording;
pub mod rep;
pub mod replay;
pub mod runtime;
pub mod session;
pub mod util;

pub use pose::{Arm, Joint, Landmark, PoseSnapshot};
pub use session::{SessionConfig, SessionController, SessionEvent, SessionStatus};
