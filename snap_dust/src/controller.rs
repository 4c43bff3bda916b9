//! The effect state machine.
//!
//! ```text
//!             snap / trigger_effect
//!   TRACKING ───────────────────────▶ DISINTEGRATING
//!      ▲                                   │
//!      └──── cloud gone / reset_effect ────┘
//! ```
//!
//! | Mode | `on_frame` does | Draws |
//! |---|---|---|
//! | Tracking | status update, snap evaluation (unless cooling down) | skeletons |
//! | Disintegrating | one simulation tick, flash advance | dust + caption |
//!
//! At most one [`EffectSession`] exists at a time.  Every physics body it
//! created is removed exactly once: by the simulation's culling, or by the
//! teardown that ends the session.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::config::EffectConfig;
use crate::emitter::{ParticleEmitter, RegionCounts};
use crate::error::DustError;
use crate::gesture::{GestureEvaluator, GestureState, SnapEvent};
use crate::landmark::LandmarkSnapshot;
use crate::particle::Particle;
use crate::physics::{EulerBackend, PhysicsBackend, PhysicsWorld};
use crate::render::{self, DrawCommand, FlashText};
use crate::simulation::{self, TickResult};

const READY_STATUS: &str = "Effect reset. Show your hand and make a snap gesture.";

// ════════════════════════════════════════════════════════════════════════════
// Public types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Tracking,
    Disintegrating,
}

/// Everything owned by one run of the effect.
#[derive(Debug)]
pub struct EffectSession<W> {
    pub particles:        Vec<Particle>,
    pub world:            W,
    pub flash:            FlashText,
    pub started_at_frame: u64,
}

impl<W: PhysicsWorld> EffectSession<W> {
    /// Remove every remaining body, then drop the world.
    fn teardown(mut self) -> usize {
        let n = self.particles.len();
        for p in self.particles.drain(..) {
            self.world.remove_body(p.body);
        }
        n
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    Snap(SnapEvent),
    EffectStarted { counts: RegionCounts, frame: u64 },
    /// Triggered with nothing tracked; the session starts empty.
    NoSource,
    EffectFinished { frame: u64 },
    Reset,
    /// Disintegrating without a session was detected and reset.
    SessionRecovered,
}

/// What the host gets back for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    pub events:   Vec<ControllerEvent>,
    pub commands: Vec<DrawCommand>,
    pub mode:     Mode,
    pub status:   String,
}

// ════════════════════════════════════════════════════════════════════════════
// EffectController
// ════════════════════════════════════════════════════════════════════════════

pub struct EffectController<B: PhysicsBackend = EulerBackend> {
    config:    EffectConfig,
    backend:   B,
    emitter:   ParticleEmitter,
    evaluator: GestureEvaluator,
    gesture:   GestureState,
    mode:      Mode,
    session:   Option<EffectSession<B::World>>,
    latest:    Option<LandmarkSnapshot>,
    /// Events raised by manual calls, reported with the next frame.
    pending:   Vec<ControllerEvent>,
    status:    String,
    rng:       StdRng,
}

impl EffectController<EulerBackend> {
    pub fn new(config: EffectConfig) -> Self {
        Self::with_backend(config, EulerBackend::default())
    }
}

impl<B: PhysicsBackend> EffectController<B> {
    pub fn with_backend(config: EffectConfig, backend: B) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        EffectController {
            emitter:   ParticleEmitter::from_config(&config),
            evaluator: GestureEvaluator::new(config.strategy, config.thresholds),
            gesture:   GestureState::new(config.cooldown_frames),
            mode:      Mode::Tracking,
            session:   None,
            latest:    None,
            pending:   Vec::new(),
            status:    "Show your hand and make a snap gesture.".to_string(),
            config,
            backend,
            rng,
        }
    }

    pub fn config(&self) -> &EffectConfig { &self.config }

    pub fn mode(&self) -> Mode { self.mode }

    pub fn status(&self) -> &str { &self.status }

    pub fn gesture(&self) -> &GestureState { &self.gesture }

    pub fn session(&self) -> Option<&EffectSession<B::World>> { self.session.as_ref() }

    pub fn particles(&self) -> &[Particle] {
        self.session.as_ref().map_or(&[], |s| s.particles.as_slice())
    }

    /// Process one captured frame.
    pub fn on_frame(&mut self, snapshot: LandmarkSnapshot) -> FrameOutput {
        let frame = snapshot.captured_at_frame;
        let mut events = std::mem::take(&mut self.pending);

        let commands = match self.mode {
            Mode::Tracking => {
                self.track(&snapshot, &mut events);
                self.latest = Some(snapshot);
                match (&self.mode, &self.session) {
                    (Mode::Disintegrating, Some(s)) => self.dust_frame(s),
                    _ => match &self.latest {
                        Some(s) => render::tracking_frame(s, self.config.canvas),
                        None => vec![DrawCommand::Background],
                    },
                }
            }
            Mode::Disintegrating => {
                self.latest = Some(snapshot);
                self.advance(frame, &mut events)
            }
        };

        FrameOutput { events, commands, mode: self.mode, status: self.status.clone() }
    }

    /// Start the effect from the latest snapshot.  `false` while it is
    /// already running.
    pub fn trigger_effect(&mut self) -> bool {
        if self.mode == Mode::Disintegrating {
            debug!("trigger ignored: effect already running");
            return false;
        }
        let mut events = Vec::new();
        self.start(&mut events);
        self.pending.extend(events);
        true
    }

    /// Tear down any running effect and return to tracking.
    pub fn reset_effect(&mut self) {
        let removed = self.teardown();
        info!(removed, "effect reset");
        self.status = READY_STATUS.to_string();
        self.pending.push(ControllerEvent::Reset);
    }

    // ── Tracking ──────────────────────────────────────────────────────────

    fn track(&mut self, snapshot: &LandmarkSnapshot, events: &mut Vec<ControllerEvent>) {
        self.status = match (snapshot.has_hands(), snapshot.has_body()) {
            (true, _) => "Hand detected",
            (false, true) => "Body detected, no hands",
            (false, false) => "No body or hand detected",
        }
        .to_string();

        let Some(evaluation) = self.gesture.observe(&self.evaluator, snapshot) else { return };
        debug!(
            frame = snapshot.captured_at_frame,
            middle = evaluation.middle.distance,
            ring = evaluation.ring.distance,
            "snap evaluation"
        );
        self.status = evaluation.status_line();

        if let Some(snap) = evaluation.event {
            events.push(ControllerEvent::Snap(snap));
            // Emit against this frame's landmarks.
            self.latest = Some(snapshot.clone());
            self.start(events);
        }
    }

    fn start(&mut self, events: &mut Vec<ControllerEvent>) {
        // Stale particles from an earlier session must not survive.
        self.teardown();

        let mut world = self.backend.create_world(self.config.gravity_vector());
        let frame = self.latest.as_ref().map_or(0, |s| s.captured_at_frame);
        let emission = match &self.latest {
            Some(snapshot) => self.emitter.emit(snapshot, self.config.particle_count, &mut world, &mut self.rng),
            None => Err(DustError::MissingData("particle emission")),
        };

        let particles = match emission {
            Ok(emission) => {
                self.status = format!(
                    "Creating disintegration effect with {} particles",
                    emission.particles.len()
                );
                events.push(ControllerEvent::EffectStarted { counts: emission.counts, frame });
                emission.particles
            }
            Err(e) => {
                warn!(frame, "{}", e);
                self.status = "No landmarks detected for particles!".to_string();
                events.push(ControllerEvent::NoSource);
                Vec::new()
            }
        };

        info!(frame, particles = particles.len(), "disintegration effect triggered");
        self.session = Some(EffectSession {
            particles,
            world,
            flash: FlashText::default(),
            started_at_frame: frame,
        });
        self.mode = Mode::Disintegrating;
    }

    // ── Disintegrating ────────────────────────────────────────────────────

    fn advance(&mut self, frame: u64, events: &mut Vec<ControllerEvent>) -> Vec<DrawCommand> {
        let canvas = self.config.canvas;
        let wind = self.config.wind;
        let flash_period = self.config.flash.enabled.then_some(self.config.flash.period);

        let result: TickResult = match self.session.as_mut() {
            Some(session) => {
                let result = simulation::tick(&mut session.world, &mut session.particles, canvas, wind);
                if let Some(period) = flash_period {
                    session.flash.advance(period);
                }
                result
            }
            None => {
                error!(frame, "{}", DustError::InvalidSession);
                self.teardown();
                self.status = READY_STATUS.to_string();
                events.push(ControllerEvent::SessionRecovered);
                return vec![DrawCommand::Background];
            }
        };

        if result.finished {
            let removed = self.teardown();
            info!(frame, removed, "dust cloud gone, back to tracking");
            self.status = READY_STATUS.to_string();
            events.push(ControllerEvent::EffectFinished { frame });
            return vec![DrawCommand::Background];
        }

        match &self.session {
            Some(s) => self.dust_frame(s),
            None => vec![DrawCommand::Background],
        }
    }

    fn dust_frame(&self, session: &EffectSession<B::World>) -> Vec<DrawCommand> {
        render::disintegration_frame(&session.particles, &self.config.flash, &session.flash, self.config.canvas)
    }

    /// Drop the session (removing its bodies), go back to tracking and forget
    /// the previous hand frame.  Returns how many bodies were removed.
    fn teardown(&mut self) -> usize {
        let removed = self.session.take().map_or(0, EffectSession::teardown);
        self.mode = Mode::Tracking;
        self.gesture.clear_previous();
        removed
    }
}
