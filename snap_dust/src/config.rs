//! Effect configuration.
//!
//! Loaded once at startup, either from the presets below or from a TOML
//! file.  Every field has a default, so a file only needs the keys it
//! overrides:
//!
//! ```toml
//! particle_count = 600
//! wind = "right"
//! strategy = "distance_delta"
//!
//! [flash]
//! enabled = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emitter::{EmitterParams, RegionWeights};
use crate::error::{DustError, DustResult};
use crate::gesture::{DetectionStrategy, SnapThresholds};
use crate::physics::Vec2;

// ════════════════════════════════════════════════════════════════════════════
// CanvasSize / WindDirection
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width:  u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        CanvasSize { width: 640, height: 480 }
    }
}

impl CanvasSize {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// Horizontal direction the dust drifts in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindDirection {
    Left,
    Right,
}

impl WindDirection {
    /// `-1.0` for left, `+1.0` for right.
    pub fn sign(self) -> f32 {
        match self {
            WindDirection::Left  => -1.0,
            WindDirection::Right =>  1.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Sub-sections
// ════════════════════════════════════════════════════════════════════════════

/// World gravity during disintegration: a horizontal wind plus a slight sink.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    /// Magnitude of the horizontal component; its sign comes from the wind.
    pub wind:  f32,
    pub drift: f32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        GravityConfig { wind: 0.3, drift: 0.05 }
    }
}

/// Large flashing caption shown while the dust blows away.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashConfig {
    pub enabled: bool,
    /// Ticks between red/white flips.
    pub period:  u32,
    /// Caption lines, drawn centered above and below the canvas middle.
    pub lines:   Vec<String>,
    /// Vertical distance of the outer lines from the canvas center.
    pub spacing: f32,
    pub size:    f32,
}

impl Default for FlashConfig {
    fn default() -> Self {
        FlashConfig {
            enabled: true,
            period:  7,
            lines:   vec!["GET DUSTBOWLED".to_string(), "IDIOT".to_string()],
            spacing: 70.0,
            size:    100.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EffectConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub canvas:          CanvasSize,
    pub particle_count:  usize,
    pub wind:            WindDirection,
    pub strategy:        DetectionStrategy,
    /// Frames the gesture evaluator stays disabled after a snap.
    pub cooldown_frames: u64,
    pub thresholds:      SnapThresholds,
    pub weights:         RegionWeights,
    pub emitter:         EmitterParams,
    pub gravity:         GravityConfig,
    pub flash:           FlashConfig,
    /// Fixed RNG seed; `None` seeds from OS entropy.
    pub seed:            Option<u64>,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self::dustbowl()
    }
}

impl EffectConfig {
    /// Whole-body effect: orientation-aware detection, dust blowing left,
    /// flashing caption.
    pub fn dustbowl() -> Self {
        EffectConfig {
            canvas:          CanvasSize::default(),
            particle_count:  1000,
            wind:            WindDirection::Left,
            strategy:        DetectionStrategy::OrientationAware,
            cooldown_frames: 30,
            thresholds:      SnapThresholds::default(),
            weights:         RegionWeights::default(),
            emitter:         EmitterParams::default(),
            gravity:         GravityConfig::default(),
            flash:           FlashConfig::default(),
            seed:            None,
        }
    }

    /// Hand-only variant: distance-delta detection, dust blowing right,
    /// no caption.
    pub fn classic() -> Self {
        EffectConfig {
            particle_count: 350,
            wind:           WindDirection::Right,
            strategy:       DetectionStrategy::DistanceDelta,
            weights:        RegionWeights { hands: 5, face: 0, body: 0 },
            emitter:        EmitterParams::classic(),
            flash:          FlashConfig { enabled: false, ..FlashConfig::default() },
            ..Self::dustbowl()
        }
    }

    /// World gravity vector for the configured wind.
    pub fn gravity_vector(&self) -> Vec2 {
        Vec2::new(self.wind.sign() * self.gravity.wind, self.gravity.drift)
    }

    pub fn from_toml_str(text: &str) -> DustResult<Self> {
        let cfg: EffectConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> DustResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> DustResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(DustError::Config("canvas must be non-empty".into()));
        }
        if self.flash.enabled && self.flash.period == 0 {
            return Err(DustError::Config("flash.period must be at least 1".into()));
        }
        self.weights.validate()?;
        self.emitter.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_dustbowl() {
        let cfg = EffectConfig::default();
        assert_eq!(cfg.particle_count, 1000);
        assert_eq!(cfg.wind, WindDirection::Left);
        assert_eq!(cfg.strategy, DetectionStrategy::OrientationAware);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn classic_blows_right_without_caption() {
        let cfg = EffectConfig::classic();
        assert_eq!(cfg.wind, WindDirection::Right);
        assert!(!cfg.flash.enabled);
        assert!(cfg.gravity_vector().x > 0.0);
        assert_eq!(cfg.weights, RegionWeights { hands: 5, face: 0, body: 0 });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn gravity_follows_wind() {
        let g = EffectConfig::dustbowl().gravity_vector();
        assert_eq!(g, Vec2::new(-0.3, 0.05));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = EffectConfig::from_toml_str(
            "particle_count = 600\nwind = \"right\"\nstrategy = \"distance_delta\"\n\n[flash]\nenabled = false\n",
        )
        .unwrap();
        assert_eq!(cfg.particle_count, 600);
        assert_eq!(cfg.wind, WindDirection::Right);
        assert_eq!(cfg.strategy, DetectionStrategy::DistanceDelta);
        assert!(!cfg.flash.enabled);
        assert_eq!(cfg.flash.period, 7);
        assert_eq!(cfg.cooldown_frames, 30);
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let err = EffectConfig::from_toml_str("[canvas]\nwidth = 0\nheight = 480\n").unwrap_err();
        assert!(matches!(err, DustError::Config(_)));
    }

    #[test]
    fn unknown_wind_is_rejected() {
        assert!(EffectConfig::from_toml_str("wind = \"up\"").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EffectConfig::load("/nonexistent/snap_dust.toml").unwrap_err();
        assert!(matches!(err, DustError::Io(_)));
    }
}
