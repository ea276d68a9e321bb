//! Advice and quality hints shown next to the live status

use crate::classifier::PostureStatus;

pub struct Advice {
    pub title: &'static str,
    pub tips: &'static [&'static str],
}

pub fn advice_for(status: PostureStatus) -> Advice {
    match status {
        PostureStatus::Good => Advice {
            title: "Excellent Posture!",
            tips: &[
                "Keep up the great work! Your spine will thank you.",
                "Remember to take a micro-break in 30 minutes.",
                "Stay hydrated and keep those shoulders relaxed.",
            ],
        },
        PostureStatus::Moderate => Advice {
            title: "Small Adjustment Needed",
            tips: &[
                "Roll your shoulders back gently.",
                "Sit up tall for 30 seconds and take a deep breath.",
                "Check that your screen is at eye level.",
                "Make sure your feet are flat on the floor.",
            ],
        },
        PostureStatus::Poor => Advice {
            title: "Time for a Reset",
            tips: &[
                "Stand up and stretch for 30 seconds.",
                "Pull your shoulder blades together 3 times, hold for 10s each.",
                "Walk around for a minute to reset your posture.",
                "Do neck rolls: 5 slow circles in each direction.",
                "Adjust your chair height or screen position.",
            ],
        },
        PostureStatus::Uncalibrated => Advice {
            title: "Get Started",
            tips: &[
                "Complete the calibration to get personalized feedback.",
                "Make sure your camera has a clear view of your upper body.",
                "Sit in your usual working position before calibrating.",
            ],
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum DetectionQuality {
    Excellent,
    Good,
    Low,
}

impl DetectionQuality {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            DetectionQuality::Excellent
        } else if confidence >= 0.5 {
            DetectionQuality::Good
        } else {
            DetectionQuality::Low
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            DetectionQuality::Low => {
                Some("Tip: Ensure good lighting and position yourself fully in frame")
            }
            _ => None,
        }
    }
}

/// Label for a day score (history scale)
pub fn day_score_label(score: f64) -> &'static str {
    if score >= 80.0 {
        "Excellent"
    } else if score >= 60.0 {
        "Good"
    } else if score >= 40.0 {
        "Fair"
    } else {
        "Needs Improvement"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_advice() {
        for status in [
            PostureStatus::Good,
            PostureStatus::Moderate,
            PostureStatus::Poor,
            PostureStatus::Uncalibrated,
        ] {
            assert!(!advice_for(status).tips.is_empty());
        }
        assert_eq!(advice_for(PostureStatus::Poor).title, "Time for a Reset");
    }

    #[test]
    fn quality_levels() {
        assert_eq!(DetectionQuality::from_confidence(0.95), DetectionQuality::Excellent);
        assert_eq!(DetectionQuality::from_confidence(0.8), DetectionQuality::Excellent);
        assert_eq!(DetectionQuality::from_confidence(0.5), DetectionQuality::Good);
        assert_eq!(DetectionQuality::from_confidence(0.49), DetectionQuality::Low);
        assert!(DetectionQuality::Low.hint().is_some());
        assert!(DetectionQuality::Good.hint().is_none());
    }

    #[test]
    fn day_score_labels() {
        assert_eq!(day_score_label(80.0), "Excellent");
        assert_eq!(day_score_label(61.0), "Good");
        assert_eq!(day_score_label(40.0), "Fair");
        assert_eq!(day_score_label(0.0), "Needs Improvement");
    }
}
