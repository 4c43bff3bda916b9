//! # snap_dust
//!
//! Finger-snap recognition over a stream of hand/pose landmark snapshots, and
//! the "dust" disintegration effect it sets off: the tracked subject breaks
//! into a wind-blown particle cloud, then the controller returns to tracking.
//!
//! ## Frame pipeline
//!
//! The host pulls one [`LandmarkSnapshot`] per video frame from its detector
//! and hands it to [`EffectController::on_frame`].  Everything after that is
//! synchronous and single-threaded:
//!
//! | Mode | Per-frame work | Output |
//! |---|---|---|
//! | `Tracking` | cooldown check → [`GestureEvaluator`] → maybe trigger | skeleton overlays |
//! | `Disintegrating` | [`simulation::tick`] → maybe tear down | dust circles + flash text |
//!
//! The controller never rasterizes.  It returns a list of [`DrawCommand`]s
//! and the host's drawing surface does the rest.
//!
//! ## Physics
//!
//! Particle motion is delegated to a [`PhysicsWorld`].  [`EulerWorld`] is the
//! built-in backend; anything implementing [`PhysicsBackend`] can replace it.
//!
//! ## Manual controls
//!
//! | Call | Effect |
//! |---|---|
//! | [`EffectController::trigger_effect`] | start the effect now (no-op while running) |
//! | [`EffectController::reset_effect`] | tear down and return to tracking |

pub mod config;
pub mod controller;
pub mod cooldown;
pub mod emitter;
pub mod error;
pub mod gesture;
pub mod landmark;
pub mod particle;
pub mod physics;
pub mod render;
pub mod simulation;

pub use config::{CanvasSize, EffectConfig, WindDirection};
pub use controller::{ControllerEvent, EffectController, EffectSession, FrameOutput, Mode};
pub use cooldown::CooldownGate;
pub use emitter::{Emission, ParticleEmitter, Region, RegionCounts};
pub use error::{DustError, DustResult};
pub use gesture::{DetectionStrategy, Evaluation, GestureEvaluator, GestureState, HandOrientation, SnapEvent, SnapFinger};
pub use landmark::{Landmark, LandmarkSnapshot};
pub use particle::{Particle, Rgba};
pub use physics::{BodyHandle, BodyParams, EulerBackend, EulerWorld, PhysicsBackend, PhysicsWorld, Vec2};
pub use render::DrawCommand;
pub use simulation::TickResult;
