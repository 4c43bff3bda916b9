//! Top-level application loop.
//!
//! `AppState` owns the [`EffectController`] and the landmark source.  Each
//! frame it applies queued keys, pulls a snapshot, feeds it to the
//! controller and hands the resulting draw list to the visualizer.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use snap_dust::{ControllerEvent, EffectConfig, EffectController, FrameOutput, HandOrientation, Mode};
use tracing::{debug, info};

use crate::source::{LandmarkSource, SimInput, SimKey, SimLandmarkSource};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub effect:      EffectConfig,
    /// Frame rate of the simulated camera.
    pub fps:         u32,
    /// Hand pose the simulated figure starts in.
    pub orientation: HandOrientation,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            effect:      EffectConfig::dustbowl(),
            fps:         30,
            orientation: HandOrientation::Upright,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

/// What a key press amounted to at the application level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Handled,
    /// Not an application key; belongs to the landmark source.
    Figure(SimKey),
    Quit,
}

pub struct AppState<S: LandmarkSource = SimLandmarkSource> {
    controller: EffectController,
    source:     S,
    frame:      u64,
    /// Effects started since launch.
    effects:    u32,
    pub status: String,
}

impl AppState<SimLandmarkSource> {
    pub fn new(cfg: AppConfig) -> Self {
        let source = SimLandmarkSource::default().with_orientation(cfg.orientation);
        AppState::with_source(cfg, source)
    }

    /// Drain window keys: controller keys are applied here, figure keys go to
    /// the simulated source.  `false` once quit was requested.
    pub fn drain_input(&mut self, rx: &Receiver<SimInput>) -> bool {
        loop {
            match rx.try_recv() {
                Ok(SimInput::KeyDown(key)) => match self.handle_key(key) {
                    KeyAction::Quit => return false,
                    KeyAction::Figure(k) => { self.source.handle_key(k); }
                    KeyAction::Handled => {}
                },
                Err(TryRecvError::Empty)        => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }
}

impl<S: LandmarkSource> AppState<S> {
    pub fn with_source(cfg: AppConfig, source: S) -> Self {
        let controller = EffectController::new(cfg.effect);
        let status = controller.status().to_string();
        AppState { controller, source, frame: 0, effects: 0, status }
    }

    pub fn controller(&self) -> &EffectController { &self.controller }

    pub fn mode(&self) -> Mode { self.controller.mode() }

    pub fn frame(&self) -> u64 { self.frame }

    pub fn effects(&self) -> u32 { self.effects }

    /// Apply the keys meant for the controller.
    pub fn handle_key(&mut self, key: SimKey) -> KeyAction {
        match key {
            SimKey::Quit => return KeyAction::Quit,
            SimKey::Trigger => {
                if !self.controller.trigger_effect() {
                    debug!("dust already blowing");
                }
            }
            SimKey::Reset => self.controller.reset_effect(),
            other => return KeyAction::Figure(other),
        }
        self.status = self.controller.status().to_string();
        KeyAction::Handled
    }

    /// Pull one snapshot and run it through the controller.
    pub fn step(&mut self) -> FrameOutput {
        let snapshot = self.source.poll(self.frame);
        let out = self.controller.on_frame(snapshot);
        for event in &out.events {
            match event {
                ControllerEvent::EffectStarted { counts, .. } => {
                    self.effects += 1;
                    info!(
                        hands = counts.hands, face = counts.face, body = counts.body,
                        "effect #{} started", self.effects
                    );
                }
                ControllerEvent::NoSource => self.effects += 1,
                other => debug!(frame = self.frame, "{:?}", other),
            }
        }
        self.status = out.status.clone();
        self.frame += 1;
        out
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the visualizer
/// and the simulated landmark source, then drives capture → evaluate/tick →
/// render once per frame on this thread.
pub fn run(cfg: AppConfig) -> Result<(), String> {
    cfg.effect.validate().map_err(|e| e.to_string())?;

    // ── Sim input channel ─────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(cfg.effect.canvas, cfg.fps, sim_tx)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(cfg);
    info!("viewer running");

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Poll window input → translate to SimInput
        if !vis.poll_input() { break; }

        // 2. Apply keys
        if !app.drain_input(&sim_rx) { break; }

        // 3. Capture, evaluate or tick
        let out = app.step();

        // 4. Render
        vis.render(&out.commands, &app.status, out.mode);
    }

    info!(frames = app.frame(), effects = app.effects(), "viewer closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use snap_dust::DrawCommand;

    fn make_app() -> AppState {
        let effect = EffectConfig { seed: Some(7), ..EffectConfig::dustbowl() };
        AppState::new(AppConfig { effect, ..AppConfig::default() })
    }

    fn run_frames(app: &mut AppState, n: usize) -> Vec<FrameOutput> {
        (0..n).map(|_| app.step()).collect()
    }

    #[test]
    fn idle_figure_keeps_tracking() {
        let mut app = make_app();
        let outs = run_frames(&mut app, 60);
        assert!(outs.iter().all(|o| o.mode == Mode::Tracking));
        assert_eq!(app.effects(), 0);
        assert!(outs[59].commands.iter().any(|c| matches!(c, DrawCommand::Line { .. })));
    }

    #[test]
    fn snap_key_disintegrates() {
        let mut app = make_app();
        run_frames(&mut app, 3);
        assert_eq!(app.handle_key(SimKey::Snap), KeyAction::Figure(SimKey::Snap));
        app.source.handle_key(SimKey::Snap);
        let outs = run_frames(&mut app, 6);
        assert!(outs.iter().any(|o| o.events.iter().any(|e| matches!(e, ControllerEvent::Snap(_)))));
        assert_eq!(app.mode(), Mode::Disintegrating);
        assert_eq!(app.effects(), 1);
    }

    #[test]
    fn sideways_snap_disintegrates() {
        let effect = EffectConfig { seed: Some(3), ..EffectConfig::dustbowl() };
        let mut app = AppState::new(AppConfig {
            effect,
            orientation: HandOrientation::Sideways,
            ..AppConfig::default()
        });
        run_frames(&mut app, 2);
        app.source.handle_key(SimKey::Snap);
        run_frames(&mut app, 6);
        assert_eq!(app.mode(), Mode::Disintegrating);
    }

    #[test]
    fn trigger_and_reset_keys() {
        let mut app = make_app();
        run_frames(&mut app, 1);
        assert_eq!(app.handle_key(SimKey::Trigger), KeyAction::Handled);
        assert_eq!(app.mode(), Mode::Disintegrating);
        assert!(app.status.starts_with("Creating disintegration effect"));
        assert_eq!(app.handle_key(SimKey::Reset), KeyAction::Handled);
        assert_eq!(app.mode(), Mode::Tracking);
        assert!(app.status.starts_with("Effect reset"));
    }

    #[test]
    fn quit_key_stops() {
        let mut app = make_app();
        assert_eq!(app.handle_key(SimKey::Quit), KeyAction::Quit);
    }

    #[test]
    fn drained_keys_reach_the_figure() {
        let mut app = make_app();
        let (tx, rx) = mpsc::channel();
        tx.send(SimInput::KeyDown(SimKey::ToggleBody)).unwrap();
        tx.send(SimInput::KeyDown(SimKey::ToggleHand)).unwrap();
        assert!(app.drain_input(&rx));
        let out = app.step();
        assert_eq!(out.status, "No body or hand detected");

        tx.send(SimInput::KeyDown(SimKey::Quit)).unwrap();
        assert!(!app.drain_input(&rx));
    }

    #[test]
    fn effect_returns_to_tracking() {
        let mut app = make_app();
        run_frames(&mut app, 1);
        app.handle_key(SimKey::Trigger);
        let mut frames = 0;
        while app.mode() == Mode::Disintegrating && frames < 400 {
            app.step();
            frames += 1;
        }
        assert_eq!(app.mode(), Mode::Tracking);
        assert!(app.controller().particles().is_empty());
    }
}
