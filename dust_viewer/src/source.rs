//! Landmark sources.
//!
//! [`LandmarkSource`] is the seam a real hand/pose detector plugs into.  The
//! viewer ships [`SimLandmarkSource`]: a synthetic standing figure with a
//! raised right hand, steered from the keyboard, that can perform a scripted
//! snap in either hand orientation.

use snap_dust::gesture::HandOrientation;
use snap_dust::landmark::{Landmark, HAND_LANDMARK_COUNT, MIDDLE_TIP, RING_TIP, THUMB_CMC, THUMB_TIP};
use snap_dust::{LandmarkSnapshot, Vec2};

// ════════════════════════════════════════════════════════════════════════════
// Trait
// ════════════════════════════════════════════════════════════════════════════

/// Produces one snapshot per video frame.  Called on the frame loop's thread;
/// must not block.
pub trait LandmarkSource {
    fn poll(&mut self, frame: u64) -> LandmarkSnapshot;
}

// ════════════════════════════════════════════════════════════════════════════
// Keyboard input
// ════════════════════════════════════════════════════════════════════════════

/// Raw input forwarded from the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
}

/// Simulated key codes (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    Snap,           // S
    Orientation,    // O
    ToggleHand,     // H
    ToggleBody,     // B
    MoveLeft,       // Left arrow
    MoveRight,      // Right arrow
    Trigger,        // Space
    Reset,          // R
    Quit,           // Q / Escape
}

// ════════════════════════════════════════════════════════════════════════════
// Figure geometry
// ════════════════════════════════════════════════════════════════════════════

/// Pose points relative to the figure's horizontal center.  Y is absolute.
const POSE_LAYOUT: [(f32, f32); 33] = [
    ( 0.000, 0.22),                                    // nose
    (-0.015, 0.20), (-0.025, 0.20), (-0.035, 0.20),    // left eye
    ( 0.015, 0.20), ( 0.025, 0.20), ( 0.035, 0.20),    // right eye
    (-0.050, 0.21), ( 0.050, 0.21),                    // ears
    (-0.020, 0.25), ( 0.020, 0.25),                    // mouth
    (-0.100, 0.35), ( 0.100, 0.35),                    // shoulders
    (-0.140, 0.48), ( 0.160, 0.40),                    // elbows
    (-0.150, 0.60), ( 0.200, 0.32),                    // wrists
    (-0.160, 0.63), ( 0.210, 0.30),                    // pinkies
    (-0.150, 0.64), ( 0.200, 0.29),                    // index
    (-0.130, 0.62), ( 0.190, 0.30),                    // thumbs
    (-0.060, 0.65), ( 0.060, 0.65),                    // hips
    (-0.070, 0.80), ( 0.070, 0.80),                    // knees
    (-0.070, 0.95), ( 0.070, 0.95),                    // ankles
    (-0.080, 0.97), ( 0.080, 0.97),                    // heels
    (-0.040, 0.99), ( 0.040, 0.99),                    // foot index
];

const POSE_VISIBILITY: f32 = 0.9;
/// Right wrist offset from the figure center.
const HAND_ANCHOR: (f32, f32) = (0.20, 0.32);
const FIGURE_MIN_X: f32 = 0.2;
const FIGURE_MAX_X: f32 = 0.6;
const MOVE_STEP:    f32 = 0.01;

/// Frames of the scripted snap: `Touch` frames, then `Flick` frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SnapPhase { Touch(u8), Flick(u8) }

const TOUCH_FRAMES: u8 = 3;
const FLICK_FRAMES: u8 = 4;

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource
// ════════════════════════════════════════════════════════════════════════════

pub struct SimLandmarkSource {
    center_x:    f32,
    orientation: HandOrientation,
    show_hand:   bool,
    show_body:   bool,
    snap:        Option<SnapPhase>,
}

impl Default for SimLandmarkSource {
    fn default() -> Self {
        SimLandmarkSource {
            center_x:    0.4,
            orientation: HandOrientation::Upright,
            show_hand:   true,
            show_body:   true,
            snap:        None,
        }
    }
}

impl SimLandmarkSource {
    pub fn with_orientation(mut self, orientation: HandOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn orientation(&self) -> HandOrientation { self.orientation }

    pub fn is_snapping(&self) -> bool { self.snap.is_some() }

    /// Apply a key that concerns the figure.  Returns `false` for keys the
    /// source does not handle.
    pub fn handle_key(&mut self, key: SimKey) -> bool {
        match key {
            SimKey::Snap => {
                if self.snap.is_none() && self.show_hand {
                    self.snap = Some(SnapPhase::Touch(0));
                }
            }
            SimKey::Orientation => {
                self.orientation = match self.orientation {
                    HandOrientation::Upright  => HandOrientation::Sideways,
                    HandOrientation::Sideways => HandOrientation::Upright,
                };
            }
            SimKey::ToggleHand => self.show_hand = !self.show_hand,
            SimKey::ToggleBody => self.show_body = !self.show_body,
            SimKey::MoveLeft  => self.center_x = (self.center_x - MOVE_STEP).max(FIGURE_MIN_X),
            SimKey::MoveRight => self.center_x = (self.center_x + MOVE_STEP).min(FIGURE_MAX_X),
            SimKey::Trigger | SimKey::Reset | SimKey::Quit => return false,
        }
        true
    }

    /// Slight idle sway so the overlays look alive.
    fn sway(frame: u64) -> f32 {
        (frame as f32 * 0.08).sin() * 0.004
    }

    fn pose(&self, cx: f32) -> Vec<Landmark> {
        POSE_LAYOUT
            .iter()
            .map(|&(dx, y)| Landmark::with_visibility(cx + dx, y, POSE_VISIBILITY))
            .collect()
    }

    /// 21-point hand whose wrist sits at `wrist`, fingers along the
    /// orientation's long axis.
    fn hand(&self, wrist: Vec2) -> Vec<Landmark> {
        // `along` points from the wrist to the knuckles, `across` spans the palm.
        let along = match self.orientation {
            HandOrientation::Upright  => Vec2::new(0.0, -1.0),
            HandOrientation::Sideways => Vec2::new(1.0, 0.0),
        };
        let across = along.perp();
        let at = |a: f32, b: f32| {
            let p = wrist + along * a + across * b;
            Landmark::new(p.x, p.y)
        };

        let mut h = Vec::with_capacity(HAND_LANDMARK_COUNT);
        h.push(at(0.0, 0.0));
        // Thumb: CMC, MCP, IP, tip.
        for k in 1..=4 {
            let k = k as f32;
            h.push(at(0.02 * k, -0.015 * k));
        }
        // Index, middle, ring, pinky: MCP then three joints out.
        for finger in 0..4 {
            let b = (finger as f32 - 1.5) * 0.025;
            for joint in 0..4 {
                h.push(at(0.10 + 0.03 * joint as f32, b));
            }
        }
        debug_assert_eq!(h.len(), HAND_LANDMARK_COUNT);

        if let Some(phase) = self.snap {
            let thumb = Vec2::new(h[THUMB_TIP].x, h[THUMB_TIP].y);
            let axis = Vec2::new(h[THUMB_TIP].x - h[THUMB_CMC].x, h[THUMB_TIP].y - h[THUMB_CMC].y);
            let perp = axis.perp().try_normalize().unwrap_or(Vec2::new(0.0, 1.0));
            let offset = match (phase, self.orientation) {
                (SnapPhase::Touch(_), HandOrientation::Upright)  => Vec2::new(0.0, -0.02),
                (SnapPhase::Touch(_), HandOrientation::Sideways) => perp * 0.01,
                (SnapPhase::Flick(_), HandOrientation::Upright)  => Vec2::new(0.0, 0.07),
                (SnapPhase::Flick(_), HandOrientation::Sideways) => perp * -0.08,
            };
            let tip = thumb + offset;
            h[MIDDLE_TIP] = Landmark::new(tip.x, tip.y);
            // Ring curls in next to the middle finger without touching.
            let ring = thumb + offset + across * 0.1;
            h[RING_TIP] = Landmark::new(ring.x, ring.y);
        }
        h
    }

    fn advance_snap(&mut self) {
        self.snap = match self.snap {
            Some(SnapPhase::Touch(n)) if n + 1 < TOUCH_FRAMES => Some(SnapPhase::Touch(n + 1)),
            Some(SnapPhase::Touch(_)) => Some(SnapPhase::Flick(0)),
            Some(SnapPhase::Flick(n)) if n + 1 < FLICK_FRAMES => Some(SnapPhase::Flick(n + 1)),
            _ => None,
        };
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn poll(&mut self, frame: u64) -> LandmarkSnapshot {
        let cx = self.center_x + Self::sway(frame);
        let mut snapshot = LandmarkSnapshot::empty(frame);
        if self.show_body {
            snapshot = snapshot.with_body(self.pose(cx));
        }
        if self.show_hand {
            let wrist = Vec2::new(cx + HAND_ANCHOR.0, HAND_ANCHOR.1);
            snapshot = snapshot.with_hand(self.hand(wrist));
        }
        self.advance_snap();
        snapshot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use snap_dust::landmark::{INDEX_MCP, WRIST};
    use snap_dust::{DetectionStrategy, GestureEvaluator, SnapFinger};
    use snap_dust::gesture::SnapThresholds;

    fn evaluator() -> GestureEvaluator {
        GestureEvaluator::new(DetectionStrategy::OrientationAware, SnapThresholds::default())
    }

    /// Run the source for `frames` frames and return the first snap frame.
    fn first_snap(source: &mut SimLandmarkSource, frames: u64) -> Option<(u64, SnapFinger)> {
        let ev = evaluator();
        let mut prev = source.poll(0);
        for f in 1..frames {
            let cur = source.poll(f);
            if let Some(snap) = ev.evaluate(&prev, &cur) {
                return Some((f, snap.finger));
            }
            prev = cur;
        }
        None
    }

    #[test]
    fn idle_hand_never_snaps() {
        let mut s = SimLandmarkSource::default();
        assert!(first_snap(&mut s, 120).is_none());
    }

    #[test]
    fn scripted_snap_upright() {
        let mut s = SimLandmarkSource::default();
        s.poll(0);
        s.handle_key(SimKey::Snap);
        assert_eq!(first_snap(&mut s, 20).map(|(_, f)| f), Some(SnapFinger::Middle));
    }

    #[test]
    fn scripted_snap_sideways() {
        let mut s = SimLandmarkSource::default().with_orientation(HandOrientation::Sideways);
        s.handle_key(SimKey::Snap);
        let ev = evaluator();
        let frames: Vec<_> = (0..8).map(|f| s.poll(f)).collect();
        let first = ev.evaluate_detailed(&frames[0], &frames[1]).unwrap();
        assert_eq!(first.orientation, Some(HandOrientation::Sideways));
        assert!(frames.windows(2).any(|w| ev.evaluate(&w[0], &w[1]).is_some()));
    }

    #[test]
    fn orientation_matches_classifier() {
        let s = SimLandmarkSource::default();
        let h = s.hand(Vec2::new(0.5, 0.5));
        let angle = (h[INDEX_MCP].y - h[WRIST].y).atan2(h[INDEX_MCP].x - h[WRIST].x).to_degrees();
        assert_eq!(HandOrientation::from_angle(angle), HandOrientation::Upright);

        let s = s.with_orientation(HandOrientation::Sideways);
        let h = s.hand(Vec2::new(0.5, 0.5));
        let angle = (h[INDEX_MCP].y - h[WRIST].y).atan2(h[INDEX_MCP].x - h[WRIST].x).to_degrees();
        assert_eq!(HandOrientation::from_angle(angle), HandOrientation::Sideways);
    }

    #[test]
    fn toggles_remove_parts() {
        let mut s = SimLandmarkSource::default();
        s.handle_key(SimKey::ToggleBody);
        let snap = s.poll(0);
        assert!(snap.has_hands() && !snap.has_body());
        s.handle_key(SimKey::ToggleHand);
        let snap = s.poll(1);
        assert!(!snap.has_hands());
        s.handle_key(SimKey::Snap);
        assert!(!s.is_snapping());
    }

    #[test]
    fn figure_stays_on_canvas() {
        let mut s = SimLandmarkSource::default();
        for _ in 0..200 { s.handle_key(SimKey::MoveRight); }
        let snap = s.poll(0);
        let max_x = snap.hands[0].iter().chain(snap.body.iter().flatten())
            .map(|l| l.x)
            .fold(0.0_f32, f32::max);
        assert!(max_x < 1.0);
    }

    #[test]
    fn app_keys_are_not_consumed() {
        let mut s = SimLandmarkSource::default();
        assert!(!s.handle_key(SimKey::Trigger));
        assert!(!s.handle_key(SimKey::Quit));
        assert!(s.handle_key(SimKey::Orientation));
        assert_eq!(s.orientation(), HandOrientation::Sideways);
    }
}
