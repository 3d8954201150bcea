use crate::session::{SessionConfig, SessionState};

/// `mm:ss`, minutes are not capped
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Progress line as shown above the camera view
pub fn set_display(state: &SessionState, config: Option<&SessionConfig>) -> String {
    let (sets, reps) = config.map_or((0, 0), |c| (c.total_sets, c.reps_per_set));
    format!(
        "Set {}/{} • Rep {}/{}",
        state.current_set, sets, state.reps_in_set, reps
    )
}
