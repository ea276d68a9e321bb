use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationState;

/// Fallback thresholds (good, moderate) in degrees when there is no calibration
pub const SITTING_THRESHOLDS: (f64, f64) = (6.0, 12.0);
pub const STANDING_THRESHOLDS: (f64, f64) = (8.0, 15.0);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum PostureStatus {
    Good,
    Moderate,
    Poor,
    Uncalibrated,
}

impl PostureStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Good" => Some(Self::Good),
            "Moderate" => Some(Self::Moderate),
            "Poor" => Some(Self::Poor),
            "Uncalibrated" => Some(Self::Uncalibrated),
            _ => None,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostureMode {
    #[default]
    Sitting,
    Standing,
}

impl PostureMode {
    pub fn toggled(self) -> Self {
        match self {
            PostureMode::Sitting => PostureMode::Standing,
            PostureMode::Standing => PostureMode::Sitting,
        }
    }
}

/// How a smoothed angle maps onto a status
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Thresholds {
    Calibrated { good: f64, moderate: f64 },
    FallbackSitting,
    FallbackStanding,
}

impl Thresholds {
    /// Calibrated thresholds win over the mode's fallback
    pub fn select(calibration: &CalibrationState, mode: PostureMode) -> Self {
        match calibration.thresholds() {
            Some((good, moderate)) => Thresholds::Calibrated { good, moderate },
            None => match mode {
                PostureMode::Sitting => Thresholds::FallbackSitting,
                PostureMode::Standing => Thresholds::FallbackStanding,
            },
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Thresholds::Calibrated { good, moderate } => (good, moderate),
            Thresholds::FallbackSitting => SITTING_THRESHOLDS,
            Thresholds::FallbackStanding => STANDING_THRESHOLDS,
        }
    }

    /// Inclusive upper bounds: equal to `good` is still Good
    pub fn classify(&self, angle: f64) -> PostureStatus {
        let (good, moderate) = self.bounds();
        if angle <= good {
            PostureStatus::Good
        } else if angle <= moderate {
            PostureStatus::Moderate
        } else {
            PostureStatus::Poor
        }
    }
}

/// EWMA weight for a sensitivity in [0, 1]; higher sensitivity reacts faster
pub fn smoothing_alpha(sensitivity: f64) -> f64 {
    0.1 + sensitivity.clamp(0.0, 1.0) * 0.1
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: PostureStatus,
    pub to: PostureStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: PostureStatus,
    pub smoothed_angle: f64,
    pub transition: Option<Transition>,
}

/// Smoothing and status memory for one monitoring session
#[derive(Debug, Clone)]
pub struct PostureClassifier {
    smoothed_angle: f64,
    current_status: PostureStatus,
}

impl Default for PostureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PostureClassifier {
    pub fn new() -> Self {
        Self::with_seed(0.0)
    }

    pub fn with_seed(smoothed_angle: f64) -> Self {
        Self {
            smoothed_angle,
            current_status: PostureStatus::Uncalibrated,
        }
    }

    pub fn smoothed_angle(&self) -> f64 {
        self.smoothed_angle
    }

    pub fn current_status(&self) -> PostureStatus {
        self.current_status
    }

    pub fn update(
        &mut self,
        raw_angle: f64,
        sensitivity: f64,
        thresholds: &Thresholds,
    ) -> Classification {
        let alpha = smoothing_alpha(sensitivity);
        self.smoothed_angle = alpha * raw_angle + (1.0 - alpha) * self.smoothed_angle;

        let status = thresholds.classify(self.smoothed_angle);
        let transition = (status != self.current_status).then_some(Transition {
            from: self.current_status,
            to: status,
        });
        self.current_status = status;

        Classification {
            status,
            smoothed_angle: self.smoothed_angle,
            transition,
        }
    }
}
