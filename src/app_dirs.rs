use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "spineguard";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/spineguard`, else the platform data dir, else cwd
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("spineguard_config.json")
        }
    }

    pub fn db_path() -> PathBuf {
        Self::state_dir().join("history.db")
    }

    pub fn calibration_path() -> PathBuf {
        Self::state_dir().join("calibration.json")
    }

    pub fn achievements_path() -> PathBuf {
        Self::state_dir().join("achievements.json")
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir().join("spineguard.log")
    }
}
