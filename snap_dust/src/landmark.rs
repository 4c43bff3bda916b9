//! Landmark snapshots delivered by the external detector.
//!
//! Coordinates are normalized to `[0, 1]` image space with Y growing
//! downward.  A snapshot is immutable once captured and superseded by the
//! next frame's snapshot.

use serde::{Deserialize, Serialize};

use crate::config::CanvasSize;
use crate::physics::Vec2;

// ════════════════════════════════════════════════════════════════════════════
// Hand landmark indices (21 per hand)
// ════════════════════════════════════════════════════════════════════════════

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

pub const HAND_LANDMARK_COUNT: usize = 21;
pub const MAX_HANDS: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// Pose landmark layout (33 points)
// ════════════════════════════════════════════════════════════════════════════

pub const POSE_LANDMARK_COUNT: usize = 33;
/// Pose indices `0..FIRST_BODY_INDEX` are the face points (nose, eyes, ears, mouth).
pub const FIRST_BODY_INDEX: usize = 11;

/// Pose landmarks at or below this confidence are treated as not visible.
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// A single tracked keypoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Detector confidence.  Hand landmarks carry `1.0`.
    #[serde(default = "full_visibility")]
    pub visibility: f32,
}

fn full_visibility() -> f32 { 1.0 }

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Landmark { x, y, visibility: 1.0 }
    }

    pub fn with_visibility(x: f32, y: f32, visibility: f32) -> Self {
        Landmark { x, y, visibility }
    }

    pub fn is_visible(&self) -> bool {
        self.visibility > VISIBILITY_THRESHOLD
    }

    /// Planar distance in normalized units.
    pub fn distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Normalized → canvas pixels.
    pub fn to_canvas(&self, canvas: CanvasSize) -> Vec2 {
        Vec2::new(self.x * canvas.width as f32, self.y * canvas.height as f32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSnapshot
// ════════════════════════════════════════════════════════════════════════════

/// Everything the detector saw in one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkSnapshot {
    /// At most [`MAX_HANDS`] hands; index 0 is the primary tracked hand.
    pub hands: Vec<Vec<Landmark>>,
    pub body: Option<Vec<Landmark>>,
    pub face: Option<Vec<Landmark>>,
    pub captured_at_frame: u64,
}

impl LandmarkSnapshot {
    pub fn empty(frame: u64) -> Self {
        LandmarkSnapshot { captured_at_frame: frame, ..Self::default() }
    }

    /// Add a hand.  Hands past [`MAX_HANDS`] and empty hands are dropped.
    pub fn with_hand(mut self, hand: Vec<Landmark>) -> Self {
        if self.hands.len() < MAX_HANDS && !hand.is_empty() {
            self.hands.push(hand);
        }
        self
    }

    pub fn with_body(mut self, body: Vec<Landmark>) -> Self {
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }

    pub fn with_face(mut self, face: Vec<Landmark>) -> Self {
        self.face = if face.is_empty() { None } else { Some(face) };
        self
    }

    pub fn primary_hand(&self) -> Option<&[Landmark]> {
        self.hands.first().map(|h| h.as_slice())
    }

    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Pose points `0..FIRST_BODY_INDEX` (the face points of the pose model).
    pub fn pose_face(&self) -> &[Landmark] {
        match &self.body {
            Some(b) => &b[..b.len().min(FIRST_BODY_INDEX)],
            None => &[],
        }
    }

    /// Pose points from [`FIRST_BODY_INDEX`] on, paired with their pose index.
    pub fn pose_body(&self) -> impl Iterator<Item = (usize, &Landmark)> {
        self.body
            .iter()
            .flat_map(|b| b.iter().enumerate().skip(FIRST_BODY_INDEX))
    }
}
