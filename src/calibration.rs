//! Two-point personal calibration
//!
//! The user captures a neutral (upright) and a slouched torso angle. Thresholds
//! sit at 40% and 75% of the way from neutral to slouch.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;

pub const GOOD_FRACTION: f64 = 0.4;
pub const MODERATE_FRACTION: f64 = 0.75;
/// Floor on slouch - neutral so thresholds never collapse onto neutral
pub const MIN_SPAN: f64 = 0.1;
/// Slouch shown after a neutral-only capture; never used for thresholds
pub const PLACEHOLDER_SLOUCH_OFFSET: f64 = 10.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("capture the neutral position before the slouch position")]
    NeutralRequired,
    #[error("no torso angle has been measured yet")]
    NoReading,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationData {
    pub neutral: f64,
    pub slouch: f64,
    pub good_threshold: f64,
    pub moderate_threshold: f64,
}

impl CalibrationData {
    /// Thresholds from a neutral/slouch pair
    pub fn derive(neutral: f64, slouch: f64) -> Self {
        let diff = (slouch - neutral).max(MIN_SPAN);
        Self {
            neutral,
            slouch,
            good_threshold: neutral + diff * GOOD_FRACTION,
            moderate_threshold: neutral + diff * MODERATE_FRACTION,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum CalibrationState {
    #[default]
    Uncalibrated,
    NeutralCaptured {
        neutral: f64,
    },
    Calibrated(CalibrationData),
}

impl CalibrationState {
    /// Record the neutral angle. Recomputes thresholds when a real slouch exists.
    pub fn capture_neutral(&mut self, raw_angle: f64) -> CalibrationData {
        match *self {
            CalibrationState::Calibrated(data) => {
                let data = CalibrationData::derive(raw_angle, data.slouch);
                *self = CalibrationState::Calibrated(data);
                data
            }
            _ => {
                *self = CalibrationState::NeutralCaptured { neutral: raw_angle };
                neutral_only(raw_angle)
            }
        }
    }

    /// Record the slouch angle; rejected until a neutral has been captured
    pub fn capture_slouch(&mut self, raw_angle: f64) -> Result<CalibrationData, CalibrationError> {
        let neutral = match *self {
            CalibrationState::Uncalibrated => return Err(CalibrationError::NeutralRequired),
            CalibrationState::NeutralCaptured { neutral } => neutral,
            CalibrationState::Calibrated(data) => data.neutral,
        };

        let data = CalibrationData::derive(neutral, raw_angle);
        *self = CalibrationState::Calibrated(data);
        Ok(data)
    }

    /// Thresholds used for classification.
    ///
    /// A neutral-only capture classifies against zero thresholds until the slouch
    /// is captured.
    pub fn thresholds(&self) -> Option<(f64, f64)> {
        match self {
            CalibrationState::Uncalibrated => None,
            CalibrationState::NeutralCaptured { .. } => Some((0.0, 0.0)),
            CalibrationState::Calibrated(data) => {
                Some((data.good_threshold, data.moderate_threshold))
            }
        }
    }

    /// Record as displayed and persisted
    pub fn view(&self) -> Option<CalibrationData> {
        match *self {
            CalibrationState::Uncalibrated => None,
            CalibrationState::NeutralCaptured { neutral } => Some(neutral_only(neutral)),
            CalibrationState::Calibrated(data) => Some(data),
        }
    }

    /// Restore from a persisted record. Zero thresholds mean only neutral was captured.
    pub fn from_stored(data: CalibrationData) -> Self {
        if data.good_threshold == 0.0 && data.moderate_threshold == 0.0 {
            CalibrationState::NeutralCaptured {
                neutral: data.neutral,
            }
        } else {
            CalibrationState::Calibrated(data)
        }
    }

    pub fn has_neutral(&self) -> bool {
        !matches!(self, CalibrationState::Uncalibrated)
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, CalibrationState::Calibrated(_))
    }
}

fn neutral_only(neutral: f64) -> CalibrationData {
    CalibrationData {
        neutral,
        slouch: neutral + PLACEHOLDER_SLOUCH_OFFSET,
        good_threshold: 0.0,
        moderate_threshold: 0.0,
    }
}

pub trait CalibrationStore {
    fn load(&self) -> CalibrationState;
    fn save(&self, state: &CalibrationState) -> crate::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileCalibrationStore {
    path: PathBuf,
}

impl FileCalibrationStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::calibration_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileCalibrationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn load(&self) -> CalibrationState {
        let Ok(bytes) = fs::read(&self.path) else {
            return CalibrationState::Uncalibrated;
        };
        match serde_json::from_slice::<CalibrationData>(&bytes) {
            Ok(data) => CalibrationState::from_stored(data),
            Err(e) => {
                tracing::warn!("ignoring unreadable calibration {}: {}", self.path.display(), e);
                CalibrationState::Uncalibrated
            }
        }
    }

    fn save(&self, state: &CalibrationState) -> crate::Result<()> {
        let Some(data) = state.view() else {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            return Ok(());
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&data)?)?;
        Ok(())
    }
}
