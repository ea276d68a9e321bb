use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::classifier::PostureMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 0 = heavy smoothing, 1 = most responsive
    pub sensitivity: f64,
    pub posture_mode: PostureMode,
    pub nudges_enabled: bool,
    pub break_reminders: bool,
    pub break_interval_mins: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            posture_mode: PostureMode::Sitting,
            nudges_enabled: true,
            break_reminders: true,
            break_interval_mins: 45,
        }
    }
}

impl Config {
    /// Clamp values edited by hand into their valid ranges
    pub fn sanitized(mut self) -> Self {
        if !self.sensitivity.is_finite() {
            self.sensitivity = Config::default().sensitivity;
        }
        self.sensitivity = self.sensitivity.clamp(0.0, 1.0);
        self.break_interval_mins = self.break_interval_mins.max(1);
        self
    }

    pub fn adjust_sensitivity(&mut self, delta: f64) {
        self.sensitivity = ((self.sensitivity + delta) * 10.0).round() / 10.0;
        self.sensitivity = self.sensitivity.clamp(0.0, 1.0);
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
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg.sanitized(),
                Err(e) => tracing::warn!("ignoring unreadable config {}: {}", self.path.display(), e),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
