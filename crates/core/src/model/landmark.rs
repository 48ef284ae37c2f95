use serde::{Deserialize, Serialize};

/// One normalized keypoint. Coordinates are relative to the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }
}

/// Keypoints detected in one frame, grouped by body part.
///
/// Any group may be missing when the model did not detect it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkFrame {
    pub face_landmarks: Option<Vec<Landmark>>,
    pub pose_landmarks: Option<Vec<Landmark>>,
    pub left_hand_landmarks: Option<Vec<Landmark>>,
    pub right_hand_landmarks: Option<Vec<Landmark>>,
}

impl LandmarkFrame {
    #[must_use]
    pub fn has_hands(&self) -> bool {
        non_empty(self.left_hand_landmarks.as_deref())
            || non_empty(self.right_hand_landmarks.as_deref())
    }
}

fn non_empty(points: Option<&[Landmark]>) -> bool {
    points.is_some_and(|p| !p.is_empty())
}

/// A `LandmarkFrame` tagged with its position in the capture sequence.
///
/// Snapshots are immutable once created; the sequence number increases
/// monotonically within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSnapshot {
    #[serde(rename = "frame")]
    sequence: u64,
    #[serde(rename = "timestamp")]
    captured_at_ms: i64,
    #[serde(flatten)]
    landmarks: LandmarkFrame,
}

impl LandmarkSnapshot {
    #[must_use]
    pub fn new(sequence: u64, captured_at_ms: i64, landmarks: LandmarkFrame) -> Self {
        Self {
            sequence,
            captured_at_ms,
            landmarks,
        }
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn captured_at_ms(&self) -> i64 {
        self.captured_at_ms
    }

    #[must_use]
    pub fn landmarks(&self) -> &LandmarkFrame {
        &self.landmarks
    }
}
