//! Draw-list construction.
//!
//! The controller never touches pixels.  Each frame it produces a flat list
//! of [`DrawCommand`]s, painted in order by the host:
//!
//! | Mode | Commands |
//! |---|---|
//! | tracking | background, pose bones + points, hand bones + points |
//! | disintegrating | background, one filled circle per particle, flash caption |

use crate::config::{CanvasSize, FlashConfig};
use crate::landmark::{Landmark, LandmarkSnapshot};
use crate::particle::{Particle, Rgba};
use crate::physics::Vec2;

// ════════════════════════════════════════════════════════════════════════════
// Skeleton tables
// ════════════════════════════════════════════════════════════════════════════

/// Bones of the 21-point hand model.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),           // thumb
    (0, 5), (5, 6), (6, 7), (7, 8),           // index
    (5, 9), (9, 10), (10, 11), (11, 12),      // middle
    (9, 13), (13, 14), (14, 15), (15, 16),    // ring
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20), // pinky + palm
];

/// Bones of the 33-point pose model.
pub const POSE_CONNECTIONS: [(usize, usize); 35] = [
    (0, 1), (1, 2), (2, 3), (3, 7), (0, 4), (4, 5), (5, 6), (6, 8), (9, 10),
    (11, 12), (11, 13), (13, 15), (15, 17), (15, 19), (15, 21), (17, 19),
    (12, 14), (14, 16), (16, 18), (16, 20), (16, 22), (18, 20),
    (11, 23), (12, 24), (23, 24),
    (23, 25), (24, 26), (25, 27), (26, 28), (27, 29), (28, 30), (29, 31), (30, 32),
    (27, 31), (28, 32),
];

pub mod colors {
    use crate::particle::Rgba;

    pub const POSE_BONE:      Rgba = Rgba::opaque(0x00, 0xB5, 0xFF);
    pub const HAND_BONE:      Rgba = Rgba::opaque(0x00, 0xFF, 0x00);
    pub const LANDMARK:       Rgba = Rgba::opaque(0xFF, 0x00, 0x00);
    pub const FLASH_ON:       Rgba = Rgba::opaque(0xFF, 0x00, 0x00);
    pub const FLASH_OFF:      Rgba = Rgba::opaque(0xFF, 0xFF, 0xFF);
    pub const OUTLINE_OUTER:  Rgba = Rgba::opaque(0x00, 0x00, 0x00);
    pub const OUTLINE_INNER:  Rgba = Rgba::opaque(0xFF, 0xFF, 0x00);
}

pub const POSE_BONE_WIDTH: f32 = 4.0;
pub const HAND_BONE_WIDTH: f32 = 5.0;
pub const LANDMARK_RADIUS: f32 = 3.0;

// ════════════════════════════════════════════════════════════════════════════
// DrawCommand
// ════════════════════════════════════════════════════════════════════════════

/// Text outline pass, painted before the fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Latest camera frame, scaled to the canvas.
    Background,
    Line   { from: Vec2, to: Vec2, color: Rgba, width: f32 },
    /// Filled circle, alpha-blended.
    Circle { center: Vec2, radius: f32, color: Rgba },
    /// Horizontally and vertically centered text.
    Text   { text: String, center: Vec2, size: f32, fill: Rgba, strokes: Vec<Stroke> },
}

// ════════════════════════════════════════════════════════════════════════════
// FlashText
// ════════════════════════════════════════════════════════════════════════════

/// Red/white flip-flop for the caption, advanced once per simulation tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlashText {
    timer: u32,
    on:    bool,
}

impl Default for FlashText {
    fn default() -> Self {
        FlashText { timer: 0, on: true }
    }
}

impl FlashText {
    pub fn reset(&mut self) {
        *self = FlashText::default();
    }

    /// Count one tick; flip after `period` of them.
    pub fn advance(&mut self, period: u32) {
        self.timer += 1;
        if self.timer >= period {
            self.timer = 0;
            self.on = !self.on;
        }
    }

    pub fn is_on(&self) -> bool { self.on }

    pub fn timer(&self) -> u32 { self.timer }

    pub fn fill(&self) -> Rgba {
        if self.on { colors::FLASH_ON } else { colors::FLASH_OFF }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Frame builders
// ════════════════════════════════════════════════════════════════════════════

fn push_skeleton(
    out: &mut Vec<DrawCommand>,
    points: &[Landmark],
    bones: &[(usize, usize)],
    color: Rgba,
    width: f32,
    canvas: CanvasSize,
) {
    for &(a, b) in bones {
        let (Some(la), Some(lb)) = (points.get(a), points.get(b)) else { continue };
        if !la.is_visible() || !lb.is_visible() { continue; }
        out.push(DrawCommand::Line {
            from: la.to_canvas(canvas),
            to:   lb.to_canvas(canvas),
            color,
            width,
        });
    }
    for l in points.iter().filter(|l| l.is_visible()) {
        out.push(DrawCommand::Circle {
            center: l.to_canvas(canvas),
            radius: LANDMARK_RADIUS,
            color:  colors::LANDMARK,
        });
    }
}

/// Camera frame with the pose skeleton under every tracked hand.
pub fn tracking_frame(snapshot: &LandmarkSnapshot, canvas: CanvasSize) -> Vec<DrawCommand> {
    let mut out = vec![DrawCommand::Background];
    if let Some(body) = &snapshot.body {
        push_skeleton(&mut out, body, &POSE_CONNECTIONS, colors::POSE_BONE, POSE_BONE_WIDTH, canvas);
    }
    for hand in &snapshot.hands {
        push_skeleton(&mut out, hand, &HAND_CONNECTIONS, colors::HAND_BONE, HAND_BONE_WIDTH, canvas);
    }
    out
}

/// Caption lines spread evenly around the canvas center, `spacing` apart
/// from it for the two-line case.
fn caption(cfg: &FlashConfig, flash: &FlashText, canvas: CanvasSize) -> Vec<DrawCommand> {
    let center = canvas.center();
    let n = cfg.lines.len();
    cfg.lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let offset = if n > 1 {
                -cfg.spacing + 2.0 * cfg.spacing * i as f32 / (n - 1) as f32
            } else {
                0.0
            };
            DrawCommand::Text {
                text:   line.clone(),
                center: Vec2::new(center.x, center.y + offset),
                size:   cfg.size,
                fill:   flash.fill(),
                strokes: vec![
                    Stroke { color: colors::OUTLINE_OUTER, width: 15.0 },
                    Stroke { color: colors::OUTLINE_INNER, width: 8.0 },
                ],
            }
        })
        .collect()
}

/// Camera frame, the dust cloud, then the caption if enabled.
pub fn disintegration_frame(
    particles: &[Particle],
    flash_cfg: &FlashConfig,
    flash: &FlashText,
    canvas: CanvasSize,
) -> Vec<DrawCommand> {
    let mut out = Vec::with_capacity(particles.len() + 1 + flash_cfg.lines.len());
    out.push(DrawCommand::Background);
    out.extend(particles.iter().map(|p| DrawCommand::Circle {
        center: p.position,
        radius: p.size,
        color:  p.display_color(),
    }));
    if flash_cfg.enabled {
        out.extend(caption(flash_cfg, flash, canvas));
    }
    out
}
