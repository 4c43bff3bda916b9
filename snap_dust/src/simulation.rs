//! Per-tick particle update and culling.
//!
//! One tick:
//!
//! 1. step the physics world and copy body state back into each particle;
//! 2. burn one unit of life;
//! 3. collect the particles that are dead or past the destroy bound;
//! 4. remove their bodies (each exactly once) and rebuild the live set;
//! 5. count survivors still on the visible side of the canvas.
//!
//! | Bound | Left | Right | Top | Bottom |
//! |---|---|---|---|---|
//! | destroy | x < -200 | x > w + 200 | y < -100 | y > h + 100 |
//! | visible (left wind) | x > -50 | | | |
//! | visible (right wind) | | x < w + 50 | | |

use tracing::{debug, warn};

use crate::config::{CanvasSize, WindDirection};
use crate::particle::Particle;
use crate::physics::{PhysicsWorld, Vec2};

pub const DESTROY_MARGIN_X: f32 = 200.0;
pub const DESTROY_MARGIN_Y: f32 = 100.0;
pub const VISIBLE_MARGIN:   f32 = 50.0;

/// Outcome of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Nothing left alive, or nothing left on the visible side.
    pub finished: bool,
    pub removed:  usize,
    pub live:     usize,
    pub visible:  usize,
}

fn out_of_bounds(p: Vec2, canvas: CanvasSize) -> bool {
    let (w, h) = (canvas.width as f32, canvas.height as f32);
    p.y > h + DESTROY_MARGIN_Y
        || p.y < -DESTROY_MARGIN_Y
        || p.x < -DESTROY_MARGIN_X
        || p.x > w + DESTROY_MARGIN_X
}

/// Still on the canvas side the dust is blowing towards?
pub fn is_visible(p: Vec2, canvas: CanvasSize, wind: WindDirection) -> bool {
    match wind {
        WindDirection::Left  => p.x > -VISIBLE_MARGIN,
        WindDirection::Right => p.x < canvas.width as f32 + VISIBLE_MARGIN,
    }
}

/// Advance `particles` and their bodies in `world` by one tick.
pub fn tick<W>(
    world: &mut W,
    particles: &mut Vec<Particle>,
    canvas: CanvasSize,
    wind: WindDirection,
) -> TickResult
where
    W: PhysicsWorld + ?Sized,
{
    world.step();

    // Phase 1: update and mark.
    let mut doomed = vec![false; particles.len()];
    for (p, doom) in particles.iter_mut().zip(doomed.iter_mut()) {
        match (world.position(p.body), world.velocity(p.body)) {
            (Some(pos), Some(vel)) => {
                p.position = pos;
                p.velocity = vel;
            }
            _ => {
                warn!(body = p.body.raw(), "particle lost its physics body");
                *doom = true;
                continue;
            }
        }
        p.life -= 1.0;
        *doom = !p.is_alive() || out_of_bounds(p.position, canvas);
    }

    // Phase 2: remove bodies, then rebuild the live set.
    let mut removed = 0;
    for (p, _) in particles.iter().zip(&doomed).filter(|(_, d)| **d) {
        world.remove_body(p.body);
        removed += 1;
    }
    if removed > 0 {
        let mut flags = doomed.into_iter();
        particles.retain(|_| !flags.next().unwrap_or(false));
    }

    let visible = particles.iter()
        .filter(|p| is_visible(p.position, canvas, wind))
        .count();
    let live = particles.len();
    let finished = live == 0 || visible == 0;
    if finished {
        debug!(live, visible, "dust cloud gone");
    }

    TickResult { finished, removed, live, visible }
}


#[cfg(test)]
mod tests {
    use super::mock::RecordingWorld;
    use super::*;
    use crate::particle::DUST_COLORS;
    use crate::physics::BodyParams;

    const CANVAS: CanvasSize = CanvasSize { width: 640, height: 480 };

    fn spawn(world: &mut RecordingWorld, at: Vec2, vel: Vec2, life: f32) -> Particle {
        let body = world.add_circle(at, 2.0, BodyParams {
            friction: 0.0, air_friction: 0.0, restitution: 0.0, density: 0.001,
        });
        world.set_velocity(body, vel);
        Particle { position: at, velocity: vel, size: 2.0, life, color: DUST_COLORS[0], body }
    }

    #[test]
    fn last_life_is_removed_after_one_tick() {
        let mut w = RecordingWorld::default();
        let mut ps = vec![spawn(&mut w, Vec2::new(300.0, 200.0), Vec2::ZERO, 1.0)];
        let r = tick(&mut w, &mut ps, CANVAS, WindDirection::Left);
        assert!(ps.is_empty());
        assert_eq!(w.body_count(), 0);
        assert_eq!(r.removed, 1);
        assert!(r.finished);
    }

    #[test]
    fn off_screen_particle_is_removed_while_alive() {
        let mut w = RecordingWorld::default();
        let mut ps = vec![
            spawn(&mut w, Vec2::new(-195.0, 200.0), Vec2::new(-10.0, 0.0), 250.0),
            spawn(&mut w, Vec2::new(300.0, 200.0), Vec2::ZERO, 250.0),
        ];
        let r = tick(&mut w, &mut ps, CANVAS, WindDirection::Left);
        assert_eq!(r.removed, 1);
        assert_eq!(ps.len(), 1);
        assert_eq!(ps[0].position, Vec2::new(300.0, 200.0));
        assert_eq!(ps[0].life, 249.0);
        assert!(!r.finished);
    }

    #[test]
    fn every_edge_is_a_destroy_bound() {
        let mut w = RecordingWorld::default();
        let mut ps = vec![
            spawn(&mut w, Vec2::new(300.0, 581.0), Vec2::ZERO, 200.0),
            spawn(&mut w, Vec2::new(300.0, -101.0), Vec2::ZERO, 200.0),
            spawn(&mut w, Vec2::new(841.0, 10.0), Vec2::ZERO, 200.0),
            spawn(&mut w, Vec2::new(300.0, 579.0), Vec2::ZERO, 200.0),
        ];
        let r = tick(&mut w, &mut ps, CANVAS, WindDirection::Right);
        assert_eq!(r.removed, 3);
        assert_eq!(r.live, 1);
    }

    #[test]
    fn bodies_are_removed_exactly_once() {
        let mut w = RecordingWorld::default();
        let mut ps: Vec<Particle> = (0..20)
            .map(|i| spawn(&mut w, Vec2::new(100.0 + i as f32, 100.0), Vec2::new(-30.0, 0.0), 3.0 + i as f32))
            .collect();
        for _ in 0..30 {
            tick(&mut w, &mut ps, CANVAS, WindDirection::Left);
        }
        assert!(ps.is_empty());
        let mut removed = w.removed.borrow().clone();
        removed.sort_unstable();
        removed.dedup();
        assert_eq!(removed.len(), w.removed.borrow().len());
        assert_eq!(removed.len(), 20);
    }

    #[test]
    fn finished_when_nothing_is_visible() {
        // Past the visible line but inside the destroy bound.
        let mut w = RecordingWorld::default();
        let mut ps = vec![spawn(&mut w, Vec2::new(-80.0, 200.0), Vec2::ZERO, 300.0)];
        let r = tick(&mut w, &mut ps, CANVAS, WindDirection::Left);
        assert_eq!(r.live, 1);
        assert_eq!(r.visible, 0);
        assert!(r.finished);
    }

    #[test]
    fn visibility_follows_wind() {
        let p = Vec2::new(-60.0, 0.0);
        assert!(!is_visible(p, CANVAS, WindDirection::Left));
        assert!(is_visible(p, CANVAS, WindDirection::Right));
        let q = Vec2::new(700.0, 0.0);
        assert!(is_visible(q, CANVAS, WindDirection::Left));
        assert!(!is_visible(q, CANVAS, WindDirection::Right));
    }

    #[test]
    fn positions_follow_the_world() {
        let mut w = RecordingWorld::default();
        let mut ps = vec![spawn(&mut w, Vec2::new(10.0, 10.0), Vec2::new(3.0, 1.0), 100.0)];
        tick(&mut w, &mut ps, CANVAS, WindDirection::Right);
        tick(&mut w, &mut ps, CANVAS, WindDirection::Right);
        assert_eq!(w.steps, 2);
        assert_eq!(ps[0].position, Vec2::new(16.0, 12.0));
        assert_eq!(ps[0].life, 98.0);
    }

    #[test]
    fn orphaned_particle_is_dropped() {
        let mut w = RecordingWorld::default();
        let mut ps = vec![spawn(&mut w, Vec2::new(10.0, 10.0), Vec2::ZERO, 100.0)];
        w.bodies.clear();
        let r = tick(&mut w, &mut ps, CANVAS, WindDirection::Right);
        assert!(ps.is_empty());
        assert!(r.finished);
    }
}
