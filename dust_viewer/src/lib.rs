//! # dust_viewer
//!
//! Windowed front end for [`snap_dust`]: a simulated camera feeds landmark
//! snapshots to the effect controller, and a software framebuffer paints the
//! draw list it returns.
//!
//! ## Frame loop
//!
//! | Step | Where |
//! |---|---|
//! | poll keys | [`visualizer::Visualizer::poll_input`] |
//! | apply keys | [`app::AppState::drain_input`] |
//! | capture → evaluate or tick | [`app::AppState::step`] |
//! | paint | [`visualizer::Visualizer::render`] |
//!
//! Everything runs on the main thread; nothing blocks between frames.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `S` | Perform a snap with the simulated hand |
//! | `O` | Toggle hand orientation (upright / sideways) |
//! | `H` | Show / hide the hand |
//! | `B` | Show / hide the body |
//! | `←` / `→` (hold) | Move the figure |
//! | `Space` | Trigger the dust effect manually |
//! | `R` | Reset the effect |
//! | `Q` / `Esc` | Quit |

pub mod app;
pub mod cli;
pub mod source;
pub mod visualizer;
