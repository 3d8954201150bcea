use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pose::Arm;
use crate::session::SessionConfig;

/// Detection thresholds in normalized image units / degrees / milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// wrist must clear the shoulder by more than this to count as raised
    pub up_thresh: f32,
    /// wrist must drop below the shoulder by more than this to count as lowered
    pub down_thresh: f32,
    /// shoulder y above this means crouching or out of frame
    pub stand_thresh: f32,
    pub elbow_angle_min: f32,
    pub hold_time_ms: u64,
    pub min_visibility: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            up_thresh: 0.10,
            down_thresh: 0.05,
            stand_thresh: 0.65,
            elbow_angle_min: 160.0,
            hold_time_ms: 1000,
            min_visibility: 0.5,
        }
    }
}

impl Thresholds {
    pub fn hold_time(&self) -> Duration {
        Duration::from_millis(self.hold_time_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub reps_per_set: u32,
    pub total_sets: u32,
    pub rest_seconds: u32,
    pub arm: Arm,
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reps_per_set: 10,
            total_sets: 3,
            rest_seconds: 30,
            arm: Arm::Right,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            reps_per_set: self.reps_per_set,
            total_sets: self.total_sets,
            rest_seconds: self.rest_seconds,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "repcue") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("repcue_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!(
                    "ignoring unreadable config {}: {}",
                    self.path.display(),
                    e
                ),
            },
            Err(e) => log::debug!("no config at {}: {}", self.path.display(), e),
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
