//! Pose keypoints as they arrive from the external pose model.
//!
//! Frames come in as one JSON object per line. The landmark payload is either the
//! 33-point MediaPipe layout (an array, `null` for undetected points) or an object
//! with named torso/head points.

use serde::{Deserialize, Serialize};

/// MediaPipe pose indices used by the pipeline
pub const NOSE: usize = 0;
pub const LEFT_EAR: usize = 7;
pub const RIGHT_EAR: usize = 8;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;

/// Image-space position; y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    pub fn midpoint(&self, other: &Keypoint) -> (f64, f64) {
        ((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// The four torso points are required; head points only feed the neck angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmarks {
    pub left_shoulder: Keypoint,
    pub right_shoulder: Keypoint,
    pub left_hip: Keypoint,
    pub right_hip: Keypoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nose: Option<Keypoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_ear: Option<Keypoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_ear: Option<Keypoint>,
}

impl PoseLandmarks {
    pub fn torso(
        left_shoulder: Keypoint,
        right_shoulder: Keypoint,
        left_hip: Keypoint,
        right_hip: Keypoint,
    ) -> Self {
        Self {
            left_shoulder,
            right_shoulder,
            left_hip,
            right_hip,
            nose: None,
            left_ear: None,
            right_ear: None,
        }
    }

    /// Build from a MediaPipe-indexed slice. Returns None when a torso point is absent.
    pub fn from_indexed(points: &[Option<Keypoint>]) -> Option<Self> {
        let at = |idx: usize| points.get(idx).copied().flatten();
        Some(Self {
            left_shoulder: at(LEFT_SHOULDER)?,
            right_shoulder: at(RIGHT_SHOULDER)?,
            left_hip: at(LEFT_HIP)?,
            right_hip: at(RIGHT_HIP)?,
            nose: at(NOSE),
            left_ear: at(LEFT_EAR),
            right_ear: at(RIGHT_EAR),
        })
    }

    fn torso_points(&self) -> [Keypoint; 4] {
        [
            self.left_shoulder,
            self.right_shoulder,
            self.left_hip,
            self.right_hip,
        ]
    }
}

/// Named landmark object where any point may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedLandmarks {
    pub left_shoulder: Option<Keypoint>,
    pub right_shoulder: Option<Keypoint>,
    pub left_hip: Option<Keypoint>,
    pub right_hip: Option<Keypoint>,
    #[serde(default)]
    pub nose: Option<Keypoint>,
    #[serde(default)]
    pub left_ear: Option<Keypoint>,
    #[serde(default)]
    pub right_ear: Option<Keypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameLandmarks {
    Indexed(Vec<Option<Keypoint>>),
    Named(NamedLandmarks),
}

/// One pose estimate from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub landmarks: FrameLandmarks,
}

impl PoseFrame {
    pub fn from_landmarks(landmarks: PoseLandmarks) -> Self {
        Self {
            timestamp_ms: None,
            confidence: None,
            landmarks: FrameLandmarks::Named(NamedLandmarks {
                left_shoulder: Some(landmarks.left_shoulder),
                right_shoulder: Some(landmarks.right_shoulder),
                left_hip: Some(landmarks.left_hip),
                right_hip: Some(landmarks.right_hip),
                nose: landmarks.nose,
                left_ear: landmarks.left_ear,
                right_ear: landmarks.right_ear,
            }),
        }
    }

    /// Torso landmarks, or None when the frame must be skipped
    pub fn pose_landmarks(&self) -> Option<PoseLandmarks> {
        match &self.landmarks {
            FrameLandmarks::Indexed(points) => PoseLandmarks::from_indexed(points),
            FrameLandmarks::Named(named) => Some(PoseLandmarks {
                left_shoulder: named.left_shoulder?,
                right_shoulder: named.right_shoulder?,
                left_hip: named.left_hip?,
                right_hip: named.right_hip?,
                nose: named.nose,
                left_ear: named.left_ear,
                right_ear: named.right_ear,
            }),
        }
    }

    /// Explicit confidence, else mean torso visibility, else 1.0
    pub fn detection_confidence(&self) -> f64 {
        if let Some(c) = self.confidence {
            return c.clamp(0.0, 1.0);
        }

        let visibilities: Vec<f64> = self
            .pose_landmarks()
            .map(|lm| {
                lm.torso_points()
                    .iter()
                    .filter_map(|p| p.visibility)
                    .collect()
            })
            .unwrap_or_default();

        crate::util::mean(&visibilities)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0)
    }
}

/// Parse one feed line. Blank lines and `#` comments yield None.
pub fn parse_frame(line: &str) -> serde_json::Result<Option<PoseFrame>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn indexed_line(with_hips: bool) -> String {
        let mut points: Vec<serde_json::Value> = vec![serde_json::Value::Null; 33];
        points[LEFT_SHOULDER] = serde_json::json!({"x": 100.0, "y": 100.0, "visibility": 0.9});
        points[RIGHT_SHOULDER] = serde_json::json!({"x": 200.0, "y": 100.0, "visibility": 0.7});
        if with_hips {
            points[LEFT_HIP] = serde_json::json!({"x": 100.0, "y": 300.0, "visibility": 0.8});
            points[RIGHT_HIP] = serde_json::json!({"x": 200.0, "y": 300.0, "visibility": 0.6});
        }
        serde_json::json!({ "timestamp_ms": 1000, "landmarks": points }).to_string()
    }

    #[test]
    fn parses_indexed_layout() {
        let frame = parse_frame(&indexed_line(true)).unwrap().unwrap();
        assert_eq!(frame.timestamp_ms, Some(1000));
        let lm = frame.pose_landmarks().unwrap();
        assert_eq!(lm.left_hip.y, 300.0);
        assert!(lm.nose.is_none());
    }

    #[test]
    fn missing_hip_skips_frame() {
        let frame = parse_frame(&indexed_line(false)).unwrap().unwrap();
        assert!(frame.pose_landmarks().is_none());
    }

    #[test]
    fn short_indexed_array_skips_frame() {
        let frame = parse_frame(r#"{"landmarks": [{"x": 1, "y": 2}]}"#)
            .unwrap()
            .unwrap();
        assert!(frame.pose_landmarks().is_none());
    }

    #[test]
    fn parses_named_layout() {
        let line = r#"{"confidence": 0.42, "landmarks": {
            "left_shoulder": {"x": 0, "y": 0},
            "right_shoulder": {"x": 2, "y": 0},
            "left_hip": {"x": 0, "y": 4},
            "right_hip": {"x": 2, "y": 4},
            "nose": {"x": 1, "y": -3}
        }}"#;
        let frame = parse_frame(line).unwrap().unwrap();
        let lm = frame.pose_landmarks().unwrap();
        assert_eq!(lm.nose, Some(Keypoint::new(1.0, -3.0)));
        assert_eq!(frame.detection_confidence(), 0.42);
    }

    #[test]
    fn confidence_falls_back_to_mean_visibility() {
        let frame = parse_frame(&indexed_line(true)).unwrap().unwrap();
        assert!((frame.detection_confidence() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn confidence_defaults_to_one_without_visibility() {
        let lm = PoseLandmarks::torso(
            Keypoint::new(0.0, 0.0),
            Keypoint::new(1.0, 0.0),
            Keypoint::new(0.0, 1.0),
            Keypoint::new(1.0, 1.0),
        );
        assert_eq!(PoseFrame::from_landmarks(lm).detection_confidence(), 1.0);
    }

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        assert_matches!(parse_frame("   "), Ok(None));
        assert_matches!(parse_frame("# recorded 2024-05-01"), Ok(None));
        assert!(parse_frame("{not json").is_err());
    }
}
