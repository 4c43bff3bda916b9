//! Dust particles and their colors.

use crate::physics::{BodyHandle, Vec2};

// ════════════════════════════════════════════════════════════════════════════
// Rgba
// ════════════════════════════════════════════════════════════════════════════

/// 8-bit color with a floating alpha in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Rgba { a: a.clamp(0.0, 1.0), ..self }
    }

    /// Packed `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u32;
        (a << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Browns and grays the dust is drawn in.
pub const DUST_COLORS: [Rgba; 5] = [
    Rgba::new(60, 40, 20, 0.8),    // brown
    Rgba::new(80, 70, 60, 0.8),    // lighter brown
    Rgba::new(50, 50, 50, 0.8),    // dark gray
    Rgba::new(70, 70, 70, 0.8),    // medium gray
    Rgba::new(100, 90, 80, 0.8),   // light tan
];

// ════════════════════════════════════════════════════════════════════════════
// Particle
// ════════════════════════════════════════════════════════════════════════════

/// Life value at which a particle is drawn fully (90 %) opaque.
pub const FADE_LIFE: f32 = 400.0;
pub const MAX_OPACITY: f32 = 0.9;

/// One grain of dust, mirrored by a body in the session's physics world.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radius in canvas pixels.
    pub size:     f32,
    /// Remaining ticks.
    pub life:     f32,
    /// Base color; the drawn alpha comes from [`Particle::opacity`].
    pub color:    Rgba,
    pub body:     BodyHandle,
}

impl Particle {
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// `clamp(life / 400, 0, 1) * 0.9`.
    pub fn opacity(&self) -> f32 {
        (self.life / FADE_LIFE).clamp(0.0, 1.0) * MAX_OPACITY
    }

    /// Color to draw this frame.
    pub fn display_color(&self) -> Rgba {
        self.color.with_alpha(self.opacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grain(life: f32) -> Particle {
        Particle {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: 2.0,
            life,
            color: DUST_COLORS[0],
            body: BodyHandle::new(0),
        }
    }

    #[test]
    fn opacity_fades_with_life() {
        assert!((grain(200.0).opacity() - 0.45).abs() < 1e-6);
        assert!((grain(400.0).opacity() - 0.9).abs() < 1e-6);
        assert!((grain(1000.0).opacity() - 0.9).abs() < 1e-6);
        assert_eq!(grain(-3.0).opacity(), 0.0);
    }

    #[test]
    fn display_color_keeps_base_rgb() {
        let c = grain(100.0).display_color();
        assert_eq!((c.r, c.g, c.b), (60, 40, 20));
        assert!((c.a - 0.225).abs() < 1e-6);
    }

    #[test]
    fn argb_packing() {
        assert_eq!(Rgba::opaque(0x12, 0x34, 0x56).to_argb(), 0xFF123456);
        assert_eq!(Rgba::new(1, 2, 3, 0.0).to_argb(), 0x00010203);
    }
}
