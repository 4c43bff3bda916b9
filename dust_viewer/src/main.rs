//! dust_viewer — interactive entry point.

use std::io::{self, Write};

use clap::Parser;
use dust_viewer::app::{run, AppConfig};
use dust_viewer::cli::Args;
use snap_dust::{DetectionStrategy, EffectConfig, HandOrientation, WindDirection};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Snap Dust — snap your fingers, turn to dust           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Source: simulated figure (keyboard driven)");
    println!();

    let cfg = match args.app_config() {
        Ok(Some(cfg)) => {
            println!("  Wind {:?}, {} particles, {} fps\n", cfg.effect.wind, cfg.effect.particle_count, cfg.fps);
            cfg
        }
        Ok(None) => configure_interactively(),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    println!();
    println!("  Opening viewer window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure_interactively() -> AppConfig {
    println!("  Preset: 1=Dustbowl (whole body, caption)  2=Classic (hand only)");
    let mut effect = match read_line("  Choice (default 1): ").trim() {
        "2" => EffectConfig::classic(),
        _   => EffectConfig::dustbowl(),
    };

    println!("  Snap detection: 1=Orientation aware  2=Distance delta");
    let default_strategy = if effect.strategy == DetectionStrategy::DistanceDelta { "2" } else { "1" };
    let choice = read_line(&format!("  Choice (default {}): ", default_strategy));
    effect.strategy = match choice.trim() {
        "1" => DetectionStrategy::OrientationAware,
        "2" => DetectionStrategy::DistanceDelta,
        _   => effect.strategy,
    };

    effect.wind = match read_line("  Wind L/R (default preset): ").trim() {
        "l" | "L" => WindDirection::Left,
        "r" | "R" => WindDirection::Right,
        _         => effect.wind,
    };

    effect.particle_count = read_line(&format!("  Particles (default {}): ", effect.particle_count))
        .trim().parse().unwrap_or(effect.particle_count).clamp(1, 5000);

    let orientation = match read_line("  Start hand sideways? y/N: ").trim() {
        "y" | "Y" => HandOrientation::Sideways,
        _         => HandOrientation::Upright,
    };

    let fps: u32 = read_line("  Camera fps (default 30): ")
        .trim().parse().unwrap_or(30).clamp(5, 120);

    AppConfig { effect, fps, orientation }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
