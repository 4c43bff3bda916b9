//! Physics seam.
//!
//! The dust effect only needs a handful of operations from a physics engine:
//! make a world with gravity, drop circles into it, kick them, step, read
//! positions back, and remove them.  [`PhysicsWorld`] captures exactly that so
//! the engine can be swapped (or mocked in tests).
//!
//! [`EulerWorld`] is the built-in backend: gravity and air friction integrated
//! once per tick, plus circle–circle contacts with restitution and friction.

use std::collections::HashMap;

/// 2-D vector used for positions, velocities and gravity.
pub use glam::Vec2;

// ════════════════════════════════════════════════════════════════════════════
// Body handles and parameters
// ════════════════════════════════════════════════════════════════════════════

/// Opaque reference to a body inside one [`PhysicsWorld`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(u32);

impl BodyHandle {
    pub fn new(raw: u32) -> Self { BodyHandle(raw) }
    pub fn raw(self) -> u32 { self.0 }
}

/// Material of a circular body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyParams {
    /// Tangential friction applied on contact.
    pub friction:     f32,
    /// Fraction of velocity lost per tick to the air.
    pub air_friction: f32,
    pub restitution:  f32,
    /// Mass per unit area.
    pub density:      f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Traits
// ════════════════════════════════════════════════════════════════════════════

/// The operations the dust effect needs from a physics engine.
///
/// All calls are synchronous.  A handle is valid until `remove_body` returns
/// `true` for it; after that every call with it is a no-op.
pub trait PhysicsWorld {
    fn add_circle(&mut self, position: Vec2, radius: f32, params: BodyParams) -> BodyHandle;
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);
    /// Advance the world by one tick.
    fn step(&mut self);
    /// Returns `false` if the body was unknown or already removed.
    fn remove_body(&mut self, body: BodyHandle) -> bool;
    fn position(&self, body: BodyHandle) -> Option<Vec2>;
    fn velocity(&self, body: BodyHandle) -> Option<Vec2>;
    fn body_count(&self) -> usize;
}

/// Factory for worlds; one world is created per effect session.
pub trait PhysicsBackend {
    type World: PhysicsWorld;
    fn create_world(&self, gravity: Vec2) -> Self::World;
}

// ════════════════════════════════════════════════════════════════════════════
// EulerWorld — built-in backend
// ════════════════════════════════════════════════════════════════════════════

/// Gravity units are "per tick at 60 fps": a gravity of 1.0 adds this many
/// px/tick to a body's velocity every tick.
const GRAVITY_SCALE: f32 = 0.001 * (1000.0 / 60.0) * (1000.0 / 60.0);

#[derive(Clone, Debug)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    radius:   f32,
    inv_mass: f32,
    params:   BodyParams,
}

/// Semi-implicit Euler integration with optional circle contacts.
///
/// Slots are never reused within a world, so a stale handle can never alias
/// a newer body.
#[derive(Debug)]
pub struct EulerWorld {
    gravity:    Vec2,
    bodies:     Vec<Option<Body>>,
    live:       usize,
    collisions: bool,
}

impl EulerWorld {
    pub fn new(gravity: Vec2) -> Self {
        EulerWorld { gravity, bodies: Vec::new(), live: 0, collisions: true }
    }

    pub fn with_collisions(mut self, on: bool) -> Self {
        self.collisions = on;
        self
    }

    pub fn gravity(&self) -> Vec2 { self.gravity }

    fn body_mut(&mut self, h: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(h.0 as usize).and_then(|b| b.as_mut())
    }

    fn body(&self, h: BodyHandle) -> Option<&Body> {
        self.bodies.get(h.0 as usize).and_then(|b| b.as_ref())
    }

    fn integrate(&mut self) {
        let accel = self.gravity * GRAVITY_SCALE;
        for body in self.bodies.iter_mut().flatten() {
            body.velocity += accel;
            body.velocity = body.velocity * (1.0 - body.params.air_friction);
            body.position += body.velocity;
        }
    }

    /// Uniform-grid broad phase followed by pairwise impulse resolution.
    fn resolve_contacts(&mut self) {
        let max_radius = self.bodies.iter().flatten()
            .map(|b| b.radius)
            .fold(0.0_f32, f32::max);
        if max_radius <= 0.0 { return; }
        let cell = max_radius * 2.0;

        let mut grid: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (i, body) in self.bodies.iter().enumerate() {
            if let Some(b) = body {
                let key = ((b.position.x / cell).floor() as i32, (b.position.y / cell).floor() as i32);
                grid.entry(key).or_default().push(i);
            }
        }

        let mut pairs = Vec::new();
        for (&(cx, cy), members) in &grid {
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(others) = grid.get(&(cx + dx, cy + dy)) else { continue };
                    for &i in members {
                        for &j in others {
                            if i < j { pairs.push((i, j)); }
                        }
                    }
                }
            }
        }

        for (i, j) in pairs {
            self.resolve_pair(i, j);
        }
    }

    fn resolve_pair(&mut self, i: usize, j: usize) {
        let (Some(mut a), Some(mut b)) = (self.bodies[i].clone(), self.bodies[j].clone()) else { return };

        let delta = b.position - a.position;
        let dist = delta.length();
        let reach = a.radius + b.radius;
        if dist >= reach { return; }
        let Some(normal) = delta.try_normalize() else { return };
        let inv_sum = a.inv_mass + b.inv_mass;
        if inv_sum <= 0.0 { return; }

        // Positional correction split by inverse mass.
        let push = normal * ((reach - dist) / inv_sum);
        a.position -= push * a.inv_mass;
        b.position += push * b.inv_mass;

        let rel = b.velocity - a.velocity;
        let vn = rel.dot(normal);
        if vn < 0.0 {
            let e = a.params.restitution.max(b.params.restitution);
            let jn = -(1.0 + e) * vn / inv_sum;
            a.velocity -= normal * (jn * a.inv_mass);
            b.velocity += normal * (jn * b.inv_mass);

            let tangent = normal.perp();
            let vt = rel.dot(tangent);
            let mu = a.params.friction.max(b.params.friction);
            let jt = (-vt / inv_sum).clamp(-mu * jn, mu * jn);
            a.velocity -= tangent * (jt * a.inv_mass);
            b.velocity += tangent * (jt * b.inv_mass);
        }

        self.bodies[i] = Some(a);
        self.bodies[j] = Some(b);
    }
}

impl PhysicsWorld for EulerWorld {
    fn add_circle(&mut self, position: Vec2, radius: f32, params: BodyParams) -> BodyHandle {
        let mass = params.density * std::f32::consts::PI * radius * radius;
        let inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(Some(Body { position, velocity: Vec2::ZERO, radius, inv_mass, params }));
        self.live += 1;
        handle
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(b) = self.body_mut(body) {
            b.velocity = velocity;
        }
    }

    fn step(&mut self) {
        self.integrate();
        if self.collisions {
            self.resolve_contacts();
        }
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        let removed = self.bodies.get_mut(body.0 as usize)
            .and_then(|slot| slot.take())
            .is_some();
        if removed {
            self.live -= 1;
        }
        removed
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.body(body).map(|b| b.position)
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.body(body).map(|b| b.velocity)
    }

    fn body_count(&self) -> usize { self.live }
}

/// Creates [`EulerWorld`]s.
#[derive(Clone, Copy, Debug)]
pub struct EulerBackend {
    pub collisions: bool,
}

impl Default for EulerBackend {
    fn default() -> Self {
        EulerBackend { collisions: true }
    }
}

impl PhysicsBackend for EulerBackend {
    type World = EulerWorld;

    fn create_world(&self, gravity: Vec2) -> EulerWorld {
        EulerWorld::new(gravity).with_collisions(self.collisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUST: BodyParams = BodyParams {
        friction: 0.03, air_friction: 0.0, restitution: 0.4, density: 0.0005,
    };

    #[test]
    fn gravity_accelerates_bodies() {
        let mut w = EulerWorld::new(Vec2::new(-0.3, 0.0)).with_collisions(false);
        let b = w.add_circle(Vec2::new(100.0, 100.0), 2.0, DUST);
        w.step();
        let v1 = w.velocity(b).unwrap();
        w.step();
        let v2 = w.velocity(b).unwrap();
        assert!(v1.x < 0.0);
        assert!(v2.x < v1.x);
        assert!(w.position(b).unwrap().x < 100.0);
    }

    #[test]
    fn air_friction_damps_velocity() {
        let params = BodyParams { air_friction: 0.5, ..DUST };
        let mut w = EulerWorld::new(Vec2::ZERO).with_collisions(false);
        let b = w.add_circle(Vec2::ZERO, 1.0, params);
        w.set_velocity(b, Vec2::new(4.0, 0.0));
        w.step();
        assert!((w.velocity(b).unwrap().x - 2.0).abs() < 1e-6);
        assert!((w.position(b).unwrap().x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn removal_happens_once() {
        let mut w = EulerWorld::new(Vec2::ZERO);
        let a = w.add_circle(Vec2::ZERO, 1.0, DUST);
        let b = w.add_circle(Vec2::new(50.0, 0.0), 1.0, DUST);
        assert_eq!(w.body_count(), 2);
        assert!(w.remove_body(a));
        assert!(!w.remove_body(a));
        assert_eq!(w.body_count(), 1);
        assert!(w.position(a).is_none());
        assert!(w.position(b).is_some());
    }

    #[test]
    fn handles_are_not_reused() {
        let mut w = EulerWorld::new(Vec2::ZERO);
        let a = w.add_circle(Vec2::ZERO, 1.0, DUST);
        w.remove_body(a);
        let b = w.add_circle(Vec2::ZERO, 1.0, DUST);
        assert_ne!(a, b);
        assert!(!w.remove_body(a));
        assert_eq!(w.body_count(), 1);
    }

    #[test]
    fn overlapping_circles_are_pushed_apart() {
        let mut w = EulerWorld::new(Vec2::ZERO);
        let a = w.add_circle(Vec2::new(0.0, 0.0), 3.0, DUST);
        let b = w.add_circle(Vec2::new(2.0, 0.0), 3.0, DUST);
        w.step();
        let gap = w.position(b).unwrap().x - w.position(a).unwrap().x;
        assert!(gap > 2.0);
    }

    #[test]
    fn approaching_circles_bounce() {
        let mut w = EulerWorld::new(Vec2::ZERO);
        let a = w.add_circle(Vec2::new(0.0, 0.0), 2.0, DUST);
        let b = w.add_circle(Vec2::new(4.5, 0.0), 2.0, DUST);
        w.set_velocity(a, Vec2::new(1.0, 0.0));
        w.set_velocity(b, Vec2::new(-1.0, 0.0));
        w.step();
        assert!(w.velocity(a).unwrap().x < 0.0);
        assert!(w.velocity(b).unwrap().x > 0.0);
    }

    #[test]
    fn unknown_handle_is_ignored() {
        let mut w = EulerWorld::new(Vec2::ZERO);
        let ghost = BodyHandle::new(42);
        w.set_velocity(ghost, Vec2::new(1.0, 1.0));
        assert!(w.position(ghost).is_none());
        assert!(!w.remove_body(ghost));
    }

    #[test]
    fn coincident_circles_are_left_alone() {
        let mut w = EulerWorld::new(Vec2::ZERO);
        let a = w.add_circle(Vec2::new(5.0, 5.0), 2.0, DUST);
        let b = w.add_circle(Vec2::new(5.0, 5.0), 2.0, DUST);
        w.step();
        assert_eq!(w.position(a), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(w.position(b), Some(Vec2::new(5.0, 5.0)));
    }
}
