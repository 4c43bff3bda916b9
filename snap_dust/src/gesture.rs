//! Finger-snap recognition.
//!
//! A snap is recognized from two consecutive snapshots of the primary hand:
//! in the previous frame the middle (or ring) fingertip is pressed against
//! the thumb tip, in the current frame it has flicked off past the thumb.
//!
//! # Strategies
//!
//! * [`DetectionStrategy::OrientationAware`]: classify the hand as upright
//!   or sideways from the wrist → index-knuckle angle.
//!   * **Upright**: the fingertip crosses from at/above the thumb tip to
//!     below it (image Y grows downward).
//!   * **Sideways**: project (finger − thumb) onto the axis perpendicular
//!     to the thumb (base → tip rotated 90°).  The projection must go from
//!     above `perpendicular_enter` to below `perpendicular_exit`.
//! * [`DetectionStrategy::DistanceDelta`]: the fingertip separates from the
//!   thumb faster than `separation_rate` per frame.  Cheaper, fooled by any
//!   fast release.
//!
//! In both, the finger must have been touching the thumb (distance below
//! `touch`) in the previous frame.  Middle wins over ring when both fire.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cooldown::CooldownGate;
use crate::error::{DustError, DustResult};
use crate::landmark::{
    Landmark, LandmarkSnapshot, INDEX_MCP, MIDDLE_TIP, RING_TIP, THUMB_CMC, THUMB_TIP, WRIST,
};
use crate::physics::Vec2;

// ════════════════════════════════════════════════════════════════════════════
// Thresholds
// ════════════════════════════════════════════════════════════════════════════

/// Normalized fingertip distance counted as "touching".
pub const TOUCH_THRESHOLD: f32 = 0.08;
/// Per-frame separation required by the distance-delta strategy.
pub const SEPARATION_RATE_THRESHOLD: f32 = 0.04;
/// Sideways: previous projection must be above this.
pub const PERPENDICULAR_ENTER: f32 = -0.03;
/// Sideways: current projection must be below this.
pub const PERPENDICULAR_EXIT: f32 = -0.05;

/// Highest landmark index the evaluator reads, plus one.
pub const REQUIRED_HAND_LANDMARKS: usize = RING_TIP + 1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapThresholds {
    pub touch:               f32,
    pub separation_rate:     f32,
    pub perpendicular_enter: f32,
    pub perpendicular_exit:  f32,
}

impl Default for SnapThresholds {
    fn default() -> Self {
        SnapThresholds {
            touch:               TOUCH_THRESHOLD,
            separation_rate:     SEPARATION_RATE_THRESHOLD,
            perpendicular_enter: PERPENDICULAR_ENTER,
            perpendicular_exit:  PERPENDICULAR_EXIT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    OrientationAware,
    DistanceDelta,
}

// ════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapFinger {
    Middle,
    Ring,
}

impl SnapFinger {
    pub fn tip_index(self) -> usize {
        match self {
            SnapFinger::Middle => MIDDLE_TIP,
            SnapFinger::Ring   => RING_TIP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SnapFinger::Middle => "middle",
            SnapFinger::Ring   => "ring",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandOrientation {
    Upright,
    Sideways,
}

impl HandOrientation {
    /// `45° < |angle| < 135°` of the wrist → index-knuckle vector is upright.
    pub fn from_angle(angle_deg: f32) -> Self {
        let a = angle_deg.abs();
        if a > 45.0 && a < 135.0 { HandOrientation::Upright } else { HandOrientation::Sideways }
    }
}

/// A recognized snap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapEvent {
    pub finger:      SnapFinger,
    /// `None` for the distance-delta strategy.
    pub orientation: Option<HandOrientation>,
    pub frame:       u64,
}

// ════════════════════════════════════════════════════════════════════════════
// Evaluation diagnostics
// ════════════════════════════════════════════════════════════════════════════

/// What the evaluator measured for one finger.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FingerReading {
    pub prev_distance: f32,
    pub distance:      f32,
    /// Strategy-specific measure before/after: vertical offset from the thumb
    /// (upright), perpendicular projection (sideways), or distance (delta).
    pub prev_measure:  f32,
    pub measure:       f32,
    pub snapped:       bool,
}

impl FingerReading {
    pub fn was_touching(&self, touch: f32) -> bool {
        self.prev_distance < touch
    }
}

/// Full result of one evaluation, including the decision.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub strategy:    DetectionStrategy,
    pub orientation: Option<HandOrientation>,
    pub hand_angle:  f32,
    pub middle:      FingerReading,
    pub ring:        FingerReading,
    pub event:       Option<SnapEvent>,
}

impl Evaluation {
    /// One-line human readable summary for the status bar.
    pub fn status_line(&self) -> String {
        if let Some(ev) = self.event {
            return format!("SNAP DETECTED! ({} finger)", ev.finger.name());
        }
        let side = |r: &FingerReading| if r.measure > 0.0 { "below" } else { "above" };
        match self.orientation {
            Some(HandOrientation::Upright) => format!(
                "Hand UPRIGHT: Mid: {:.3} ({}), Ring: {:.3} ({})",
                self.middle.distance, side(&self.middle), self.ring.distance, side(&self.ring),
            ),
            Some(HandOrientation::Sideways) => format!(
                "Hand SIDEWAYS ({:.0} deg): Mid: {:.3}, Ring: {:.3}",
                self.hand_angle, self.middle.measure, self.ring.measure,
            ),
            None => format!(
                "Mid: {:.3} ({:+.3}), Ring: {:.3} ({:+.3})",
                self.middle.distance, self.middle.distance - self.middle.prev_distance,
                self.ring.distance, self.ring.distance - self.ring.prev_distance,
            ),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureEvaluator
// ════════════════════════════════════════════════════════════════════════════

/// Stateless snap classifier over a (previous, current) snapshot pair.
#[derive(Clone, Copy, Debug)]
pub struct GestureEvaluator {
    pub strategy:   DetectionStrategy,
    pub thresholds: SnapThresholds,
}

impl Default for GestureEvaluator {
    fn default() -> Self {
        GestureEvaluator::new(DetectionStrategy::OrientationAware, SnapThresholds::default())
    }
}

impl GestureEvaluator {
    pub fn new(strategy: DetectionStrategy, thresholds: SnapThresholds) -> Self {
        GestureEvaluator { strategy, thresholds }
    }

    /// `Some` only when a snap happened between the two snapshots.
    pub fn evaluate(&self, previous: &LandmarkSnapshot, current: &LandmarkSnapshot) -> Option<SnapEvent> {
        self.evaluate_detailed(previous, current).ok().and_then(|e| e.event)
    }

    /// Evaluate and return every measurement taken along the way.
    ///
    /// Fails with `MissingData` when either snapshot lacks a hand and with
    /// `DegenerateInput` when a hand is too short to index every fingertip.
    pub fn evaluate_detailed(
        &self,
        previous: &LandmarkSnapshot,
        current: &LandmarkSnapshot,
    ) -> DustResult<Evaluation> {
        let prev = hand_of(previous)?;
        let cur  = hand_of(current)?;

        let knuckle = vec_between(&cur[WRIST], &cur[INDEX_MCP]);
        let hand_angle = knuckle.y.atan2(knuckle.x).to_degrees();

        let (orientation, middle, ring) = match self.strategy {
            DetectionStrategy::DistanceDelta => (
                None,
                self.distance_delta(prev, cur, MIDDLE_TIP),
                self.distance_delta(prev, cur, RING_TIP),
            ),
            DetectionStrategy::OrientationAware => match HandOrientation::from_angle(hand_angle) {
                HandOrientation::Upright => (
                    Some(HandOrientation::Upright),
                    self.upright(prev, cur, MIDDLE_TIP),
                    self.upright(prev, cur, RING_TIP),
                ),
                HandOrientation::Sideways => {
                    let thumb_axis = vec_between(&cur[THUMB_CMC], &cur[THUMB_TIP]);
                    match thumb_axis.perp().try_normalize() {
                        Some(perp) => (
                            Some(HandOrientation::Sideways),
                            self.sideways(prev, cur, MIDDLE_TIP, perp),
                            self.sideways(prev, cur, RING_TIP, perp),
                        ),
                        None => {
                            debug!("thumb base and tip coincide; no sideways axis");
                            let flat = |tip: usize| FingerReading {
                                prev_distance: prev[THUMB_TIP].distance(&prev[tip]),
                                distance:      cur[THUMB_TIP].distance(&cur[tip]),
                                ..FingerReading::default()
                            };
                            (Some(HandOrientation::Sideways), flat(MIDDLE_TIP), flat(RING_TIP))
                        }
                    }
                }
            },
        };

        let finger = if middle.snapped {
            Some(SnapFinger::Middle)
        } else if ring.snapped {
            Some(SnapFinger::Ring)
        } else {
            None
        };
        let event = finger.map(|finger| SnapEvent {
            finger,
            orientation,
            frame: current.captured_at_frame,
        });

        Ok(Evaluation { strategy: self.strategy, orientation, hand_angle, middle, ring, event })
    }

    fn distance_delta(&self, prev: &[Landmark], cur: &[Landmark], tip: usize) -> FingerReading {
        let prev_distance = prev[THUMB_TIP].distance(&prev[tip]);
        let distance = cur[THUMB_TIP].distance(&cur[tip]);
        let snapped = prev_distance < self.thresholds.touch
            && distance - prev_distance > self.thresholds.separation_rate;
        FingerReading {
            prev_distance,
            distance,
            prev_measure: prev_distance,
            measure: distance,
            snapped,
        }
    }

    fn upright(&self, prev: &[Landmark], cur: &[Landmark], tip: usize) -> FingerReading {
        let prev_distance = prev[THUMB_TIP].distance(&prev[tip]);
        let distance = cur[THUMB_TIP].distance(&cur[tip]);
        let prev_measure = prev[tip].y - prev[THUMB_TIP].y;
        let measure = cur[tip].y - cur[THUMB_TIP].y;
        let snapped = prev_distance < self.thresholds.touch
            && prev_measure <= 0.0
            && measure > 0.0;
        FingerReading { prev_distance, distance, prev_measure, measure, snapped }
    }

    fn sideways(&self, prev: &[Landmark], cur: &[Landmark], tip: usize, perp: Vec2) -> FingerReading {
        let prev_distance = prev[THUMB_TIP].distance(&prev[tip]);
        let distance = cur[THUMB_TIP].distance(&cur[tip]);
        let prev_measure = vec_between(&prev[THUMB_TIP], &prev[tip]).dot(perp);
        let measure = vec_between(&cur[THUMB_TIP], &cur[tip]).dot(perp);
        let snapped = prev_distance < self.thresholds.touch
            && prev_measure > self.thresholds.perpendicular_enter
            && measure < self.thresholds.perpendicular_exit;
        FingerReading { prev_distance, distance, prev_measure, measure, snapped }
    }
}

fn hand_of(snapshot: &LandmarkSnapshot) -> DustResult<&[Landmark]> {
    let hand = snapshot
        .primary_hand()
        .ok_or(DustError::MissingData("gesture evaluation"))?;
    if hand.len() < REQUIRED_HAND_LANDMARKS {
        return Err(DustError::DegenerateInput {
            needed: REQUIRED_HAND_LANDMARKS,
            found:  hand.len(),
        });
    }
    Ok(hand)
}

fn vec_between(from: &Landmark, to: &Landmark) -> Vec2 {
    Vec2::new(to.x - from.x, to.y - from.y)
}

// ════════════════════════════════════════════════════════════════════════════
// GestureState — per-hand tracking memory
// ════════════════════════════════════════════════════════════════════════════

/// Previous snapshot and cooldown latch for one tracked hand.
#[derive(Clone, Debug)]
pub struct GestureState {
    previous: Option<LandmarkSnapshot>,
    cooldown: CooldownGate,
}

impl GestureState {
    pub fn new(cooldown_frames: u64) -> Self {
        GestureState { previous: None, cooldown: CooldownGate::new(cooldown_frames) }
    }

    pub fn previous(&self) -> Option<&LandmarkSnapshot> { self.previous.as_ref() }

    pub fn cooldown(&self) -> &CooldownGate { &self.cooldown }

    /// Compare `current` against the stored previous frame, then make
    /// `current` the new previous frame.
    ///
    /// Returns `None` when nothing was evaluated: no previous frame, cooldown
    /// still running, or unusable landmarks.  A snap arms the cooldown.
    pub fn observe(&mut self, evaluator: &GestureEvaluator, current: &LandmarkSnapshot) -> Option<Evaluation> {
        let now = current.captured_at_frame;
        let evaluation = match &self.previous {
            Some(prev) if !self.cooldown.is_active(now) => {
                match evaluator.evaluate_detailed(prev, current) {
                    Ok(e) => Some(e),
                    Err(e @ DustError::DegenerateInput { .. }) => {
                        warn!(frame = now, "skipping snap evaluation: {}", e);
                        None
                    }
                    Err(e) => {
                        debug!(frame = now, "skipping snap evaluation: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        if let Some(ev) = evaluation.as_ref().and_then(|e| e.event) {
            info!(frame = now, finger = ev.finger.name(), "snap detected");
            self.cooldown.arm(now);
        }

        self.previous = if current.has_hands() { Some(current.clone()) } else { None };
        evaluation
    }

    /// Forget the previous frame so the next one becomes a fresh baseline.
    pub fn clear_previous(&mut self) {
        self.previous = None;
    }
}
