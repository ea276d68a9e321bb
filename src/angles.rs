//! Torso and neck angles from pose landmarks
//!
//! Torso angle is the lean of the hip→shoulder midpoint line away from vertical.
//! Neck angle is measured at the ear between the nose and the shoulder.

use crate::landmarks::{Keypoint, PoseLandmarks};

const MIN_VECTOR_LEN: f64 = 1e-9;

/// Torso lean in degrees, 0° upright, 90° horizontal
///
/// Uses absolute offsets between shoulder and hip midpoints, so forward and
/// lateral lean both count and the result stays within [0°, 90°].
/// Coincident midpoints give atan2(0, 0) = 0°.
pub fn torso_angle(landmarks: &PoseLandmarks) -> f64 {
    let shoulder_mid = landmarks
        .left_shoulder
        .midpoint(&landmarks.right_shoulder);
    let hip_mid = landmarks.left_hip.midpoint(&landmarks.right_hip);

    let dx = (shoulder_mid.0 - hip_mid.0).abs();
    let dy = (shoulder_mid.1 - hip_mid.1).abs();

    dx.atan2(dy).to_degrees()
}

/// Neck angle in degrees at the ear, between ear→nose and ear→shoulder
///
/// Prefers the left ear/shoulder pair, then the right one. None when a point is
/// missing or either vector is degenerate.
pub fn neck_angle(landmarks: &PoseLandmarks) -> Option<f64> {
    let nose = landmarks.nose?;
    let (ear, shoulder) = match (landmarks.left_ear, landmarks.right_ear) {
        (Some(ear), _) => (ear, landmarks.left_shoulder),
        (None, Some(ear)) => (ear, landmarks.right_shoulder),
        (None, None) => return None,
    };

    angle_at(ear, nose, shoulder)
}

/// Angle at `vertex` between vertex→a and vertex→b
fn angle_at(vertex: Keypoint, a: Keypoint, b: Keypoint) -> Option<f64> {
    let v1 = (a.x - vertex.x, a.y - vertex.y);
    let v2 = (b.x - vertex.x, b.y - vertex.y);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    if mag1 < MIN_VECTOR_LEN || mag2 < MIN_VECTOR_LEN {
        return None;
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torso(shoulder_mid: (f64, f64), hip_mid: (f64, f64)) -> PoseLandmarks {
        PoseLandmarks::torso(
            Keypoint::new(shoulder_mid.0 - 10.0, shoulder_mid.1),
            Keypoint::new(shoulder_mid.0 + 10.0, shoulder_mid.1),
            Keypoint::new(hip_mid.0 - 10.0, hip_mid.1),
            Keypoint::new(hip_mid.0 + 10.0, hip_mid.1),
        )
    }

    #[test]
    fn coincident_midpoints_are_upright() {
        let p = Keypoint::new(50.0, 50.0);
        let lm = PoseLandmarks::torso(p, p, p, p);
        assert_eq!(torso_angle(&lm), 0.0);
    }

    #[test]
    fn vertical_stack_is_zero() {
        assert_eq!(torso_angle(&torso((100.0, 100.0), (100.0, 300.0))), 0.0);
    }

    #[test]
    fn horizontal_offset_is_ninety() {
        let angle = torso_angle(&torso((300.0, 200.0), (100.0, 200.0)));
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn forty_five_degree_lean() {
        let angle = torso_angle(&torso((200.0, 100.0), (100.0, 200.0)));
        assert!((angle - 45.0).abs() < 1e-9);
    }

    #[test]
    fn lean_direction_does_not_matter() {
        let left = torso_angle(&torso((80.0, 100.0), (100.0, 300.0)));
        let right = torso_angle(&torso((120.0, 100.0), (100.0, 300.0)));
        assert!((left - right).abs() < 1e-9);
        assert!(left > 0.0 && left < 90.0);
    }

    #[test]
    fn neck_angle_right_angle() {
        let mut lm = torso((0.0, 10.0), (0.0, 30.0));
        lm.left_shoulder = Keypoint::new(0.0, 10.0);
        lm.left_ear = Some(Keypoint::new(0.0, 0.0));
        lm.nose = Some(Keypoint::new(5.0, 0.0));
        let angle = neck_angle(&lm).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn neck_angle_uses_right_side_without_left_ear() {
        let mut lm = torso((0.0, 10.0), (0.0, 30.0));
        lm.right_shoulder = Keypoint::new(0.0, 10.0);
        lm.right_ear = Some(Keypoint::new(0.0, 0.0));
        lm.nose = Some(Keypoint::new(0.0, -5.0));
        let angle = neck_angle(&lm).unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn neck_angle_missing_points() {
        let mut lm = torso((0.0, 10.0), (0.0, 30.0));
        assert_eq!(neck_angle(&lm), None);
        lm.nose = Some(Keypoint::new(1.0, 1.0));
        assert_eq!(neck_angle(&lm), None);
    }

    #[test]
    fn neck_angle_degenerate_vector() {
        let mut lm = torso((0.0, 10.0), (0.0, 30.0));
        lm.left_ear = Some(Keypoint::new(3.0, 3.0));
        lm.nose = Some(Keypoint::new(3.0, 3.0));
        assert_eq!(neck_angle(&lm), None);
        // torso angle is unaffected by a degenerate head
        assert_eq!(torso_angle(&lm), 0.0);
    }
}
