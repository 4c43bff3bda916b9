//! Command-line options.
//!
//! With no preset flag the binary falls back to interactive prompts.

use std::path::PathBuf;

use clap::Parser;
use snap_dust::{EffectConfig, HandOrientation};

use crate::app::AppConfig;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "dust_viewer", version, about = "Snap your fingers, turn to dust")]
pub struct Args {
    /// Dustbowl preset without prompts.
    #[arg(long, conflicts_with_all = ["classic", "config"])]
    pub quick: bool,

    /// Hand-only dust blowing right, no caption.
    #[arg(long, conflicts_with = "config")]
    pub classic: bool,

    /// Effect configuration file (TOML).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Simulated camera frame rate.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(5..=120))]
    pub fps: u32,

    /// Start the simulated hand sideways.
    #[arg(long)]
    pub sideways: bool,
}

impl Args {
    /// Config chosen by flags; `None` means ask interactively.
    pub fn app_config(&self) -> Result<Option<AppConfig>, String> {
        let effect = if self.quick {
            EffectConfig::dustbowl()
        } else if self.classic {
            EffectConfig::classic()
        } else if let Some(path) = &self.config {
            EffectConfig::load(path).map_err(|e| format!("{}: {}", path.display(), e))?
        } else {
            return Ok(None);
        };
        let orientation = if self.sideways { HandOrientation::Sideways } else { HandOrientation::Upright };
        Ok(Some(AppConfig { effect, fps: self.fps, orientation }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snap_dust::WindDirection;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("dust_viewer").chain(args.iter().copied()))
    }

    #[test]
    fn no_flags_means_prompts() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.fps, 30);
        assert_eq!(args.app_config().unwrap(), None);
    }

    #[test]
    fn quick_uses_dustbowl() {
        let cfg = parse(&["--quick"]).unwrap().app_config().unwrap().unwrap();
        assert_eq!(cfg.effect, EffectConfig::dustbowl());
        assert_eq!(cfg.orientation, HandOrientation::Upright);
    }

    #[test]
    fn classic_with_overrides() {
        let cfg = parse(&["--classic", "--fps", "60", "--sideways"]).unwrap().app_config().unwrap().unwrap();
        assert_eq!(cfg.effect.wind, WindDirection::Right);
        assert_eq!(cfg.fps, 60);
        assert_eq!(cfg.orientation, HandOrientation::Sideways);
    }

    #[test]
    fn presets_conflict() {
        assert!(parse(&["--quick", "--classic"]).is_err());
        assert!(parse(&["--classic", "--config", "x.toml"]).is_err());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse(&["--fps", "1000"]).is_err());
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = parse(&["--config", "/nonexistent/dust.toml"]).unwrap().app_config().unwrap_err();
        assert!(err.starts_with("/nonexistent/dust.toml"));
    }
}
