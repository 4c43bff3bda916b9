//! Weighted particle spawning across hands, face and body.
//!
//! The total particle budget is split between the regions that are actually
//! visible in the snapshot, in proportion to their weights:
//!
//! | Region | Source landmarks | Weight | Spread |
//! |---|---|---|---|
//! | hands | every landmark of every tracked hand | 5 | 100 px |
//! | face | pose points 0–10, present if any is visible | 12 | 100 px |
//! | body | visible pose points 11+ | 15 | 120 px |
//!
//! Each region gets `floor(total * weight / sum)`; the body (or, without a
//! body, the heaviest remaining region) takes the rounding remainder so the
//! emitted count is exactly `total`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{CanvasSize, EffectConfig, WindDirection};
use crate::error::{DustError, DustResult};
use crate::landmark::{Landmark, LandmarkSnapshot};
use crate::particle::{Particle, DUST_COLORS};
use crate::physics::{BodyParams, PhysicsWorld, Vec2};

// ════════════════════════════════════════════════════════════════════════════
// Regions and weights
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Hands,
    Face,
    Body,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionWeights {
    pub hands: u32,
    pub face:  u32,
    pub body:  u32,
}

impl Default for RegionWeights {
    fn default() -> Self {
        RegionWeights { hands: 5, face: 12, body: 15 }
    }
}

impl RegionWeights {
    pub fn of(&self, region: Region) -> u32 {
        match region {
            Region::Hands => self.hands,
            Region::Face  => self.face,
            Region::Body  => self.body,
        }
    }

    pub fn validate(&self) -> DustResult<()> {
        let sum = self.hands as u64 + self.face as u64 + self.body as u64;
        if sum == 0 {
            return Err(DustError::Config("at least one region weight must be positive".into()));
        }
        Ok(())
    }
}

/// How many particles each region receives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionCounts {
    pub hands: usize,
    pub face:  usize,
    pub body:  usize,
}

impl RegionCounts {
    pub fn total(&self) -> usize {
        self.hands + self.face + self.body
    }

    pub fn of(&self, region: Region) -> usize {
        match region {
            Region::Hands => self.hands,
            Region::Face  => self.face,
            Region::Body  => self.body,
        }
    }

    fn slot(&mut self, region: Region) -> &mut usize {
        match region {
            Region::Hands => &mut self.hands,
            Region::Face  => &mut self.face,
            Region::Body  => &mut self.body,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Spawn parameters
// ════════════════════════════════════════════════════════════════════════════

/// Per-particle randomization ranges and physics material.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterParams {
    /// Width of the square offset window around a hand landmark (px).
    pub hand_spread:    f32,
    pub face_spread:    f32,
    pub body_spread:    f32,
    pub size_min:       f32,
    pub size_max:       f32,
    /// Lifetime in ticks.
    pub life_min:       f32,
    pub life_max:       f32,
    /// Initial speed along the wind (px/tick).
    pub speed_min:      f32,
    pub speed_max:      f32,
    /// Width of the symmetric vertical velocity window (px/tick).
    pub vertical_range: f32,
    pub friction:       f32,
    pub air_friction:   f32,
    pub restitution:    f32,
    pub density_min:    f32,
    pub density_max:    f32,
}

impl Default for EmitterParams {
    fn default() -> Self {
        EmitterParams {
            hand_spread:    100.0,
            face_spread:    100.0,
            body_spread:    120.0,
            size_min:       1.5,
            size_max:       5.5,
            life_min:       150.0,
            life_max:       300.0,
            speed_min:      1.0,
            speed_max:      4.0,
            vertical_range: 2.5,
            friction:       0.03,
            air_friction:   0.001,
            restitution:    0.4,
            density_min:    0.0002,
            density_max:    0.0007,
        }
    }
}

impl EmitterParams {
    /// Tighter, slower, longer-lived dust of the hand-only effect.
    pub fn classic() -> Self {
        EmitterParams {
            hand_spread:    40.0,
            face_spread:    40.0,
            body_spread:    40.0,
            size_min:       1.0,
            size_max:       4.0,
            life_min:       200.0,
            life_max:       400.0,
            speed_min:      0.5,
            speed_max:      2.5,
            vertical_range: 1.5,
            friction:       0.05,
            air_friction:   0.002,
            restitution:    0.3,
            density_min:    0.0005,
            density_max:    0.0015,
        }
    }

    pub fn spread(&self, region: Region) -> f32 {
        match region {
            Region::Hands => self.hand_spread,
            Region::Face  => self.face_spread,
            Region::Body  => self.body_spread,
        }
    }

    pub fn validate(&self) -> DustResult<()> {
        let ranges = [
            ("size", self.size_min, self.size_max),
            ("life", self.life_min, self.life_max),
            ("speed", self.speed_min, self.speed_max),
            ("density", self.density_min, self.density_max),
        ];
        for (name, lo, hi) in ranges {
            if lo > hi {
                return Err(DustError::Config(format!("emitter.{name}_min exceeds {name}_max")));
            }
        }
        if self.size_min <= 0.0 || self.life_min <= 0.0 {
            return Err(DustError::Config("particle size and life must be positive".into()));
        }
        Ok(())
    }
}

/// `lo + u * (hi - lo)` for a uniform `u` in `[0, 1)`.
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + rng.gen::<f32>() * (hi - lo)
}

// ════════════════════════════════════════════════════════════════════════════
// Spawn sources
// ════════════════════════════════════════════════════════════════════════════

/// Landmarks each region can spawn from, resolved once per emission.
struct Sources<'a> {
    hands:        Vec<&'a [Landmark]>,
    /// Candidate face points, visible or not; present only if one is visible.
    face:         &'a [Landmark],
    visible_face: Vec<&'a Landmark>,
    visible_body: Vec<&'a Landmark>,
}

impl<'a> Sources<'a> {
    fn resolve(snapshot: &'a LandmarkSnapshot) -> Self {
        let hands = snapshot.hands
            .iter()
            .filter(|h| !h.is_empty())
            .map(|h| h.as_slice())
            .collect();

        // Pose face points first; a face mesh only stands in when no pose exists.
        let face = match (&snapshot.body, &snapshot.face) {
            (Some(_), _) => snapshot.pose_face(),
            (None, Some(mesh)) => mesh.as_slice(),
            (None, None) => &[],
        };
        let visible_face = face.iter().filter(|l| l.is_visible()).collect();
        let visible_body = snapshot.pose_body()
            .map(|(_, l)| l)
            .filter(|l| l.is_visible())
            .collect();

        Sources { hands, face, visible_face, visible_body }
    }

    fn is_present(&self, region: Region) -> bool {
        match region {
            Region::Hands => !self.hands.is_empty(),
            Region::Face  => !self.visible_face.is_empty(),
            Region::Body  => !self.visible_body.is_empty(),
        }
    }

    /// Pick a spawn landmark for `region`.  A non-visible pick falls back to
    /// a visible body point, then to a visible point of the region itself.
    fn pick<R: Rng + ?Sized>(&self, region: Region, rng: &mut R) -> Option<&'a Landmark> {
        let choose = |set: &[&'a Landmark], rng: &mut R| -> Option<&'a Landmark> {
            if set.is_empty() { None } else { Some(set[rng.gen_range(0..set.len())]) }
        };

        let candidate = match region {
            Region::Body => return choose(&self.visible_body, rng),
            Region::Face => {
                let face = self.face;
                if face.is_empty() { return None; }
                &face[rng.gen_range(0..face.len())]
            }
            Region::Hands => {
                if self.hands.is_empty() { return None; }
                let hand = self.hands[rng.gen_range(0..self.hands.len())];
                &hand[rng.gen_range(0..hand.len())]
            }
        };
        if candidate.is_visible() {
            return Some(candidate);
        }
        if let Some(fallback) = choose(&self.visible_body, rng) {
            return Some(fallback);
        }
        match region {
            Region::Face => choose(&self.visible_face, rng),
            _ => Some(candidate),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleEmitter
// ════════════════════════════════════════════════════════════════════════════

/// Result of one emission.
#[derive(Debug, Default)]
pub struct Emission {
    pub particles: Vec<Particle>,
    pub counts:    RegionCounts,
}

impl Emission {
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ParticleEmitter {
    pub canvas:  CanvasSize,
    pub wind:    WindDirection,
    pub weights: RegionWeights,
    pub params:  EmitterParams,
}

impl ParticleEmitter {
    pub fn from_config(cfg: &EffectConfig) -> Self {
        ParticleEmitter {
            canvas:  cfg.canvas,
            wind:    cfg.wind,
            weights: cfg.weights,
            params:  cfg.emitter,
        }
    }

    /// Split `total` between the regions present in `snapshot`.
    ///
    /// `MissingData` when no region with a positive weight is present.
    pub fn plan(&self, snapshot: &LandmarkSnapshot, total: usize) -> DustResult<RegionCounts> {
        self.plan_for(&Sources::resolve(snapshot), total)
    }

    fn plan_for(&self, sources: &Sources<'_>, total: usize) -> DustResult<RegionCounts> {
        // Remainder preference: body, then face, then hands.
        let order = [Region::Body, Region::Face, Region::Hands];
        let present: Vec<Region> = order
            .into_iter()
            .filter(|&r| sources.is_present(r) && self.weights.of(r) > 0)
            .collect();
        let sum: u64 = present.iter().map(|&r| self.weights.of(r) as u64).sum();
        if sum == 0 {
            return Err(DustError::MissingData("particle emission"));
        }

        let mut counts = RegionCounts::default();
        for &r in &present {
            *counts.slot(r) = (total as u64 * self.weights.of(r) as u64 / sum) as usize;
        }
        let remainder = total - counts.total();
        *counts.slot(present[0]) += remainder;
        Ok(counts)
    }

    /// Spawn `total` particles from `snapshot` into `world`.
    pub fn emit<W, R>(
        &self,
        snapshot: &LandmarkSnapshot,
        total: usize,
        world: &mut W,
        rng: &mut R,
    ) -> DustResult<Emission>
    where
        W: PhysicsWorld + ?Sized,
        R: Rng + ?Sized,
    {
        let sources = Sources::resolve(snapshot);
        let counts = self.plan_for(&sources, total)?;
        debug!(
            hands = counts.hands, face = counts.face, body = counts.body,
            "particle distribution"
        );

        let mut particles = Vec::with_capacity(total);
        for region in [Region::Hands, Region::Face, Region::Body] {
            for _ in 0..counts.of(region) {
                if let Some(at) = sources.pick(region, rng) {
                    particles.push(self.spawn(region, at, world, rng));
                }
            }
        }
        info!(count = particles.len(), frame = snapshot.captured_at_frame, "dust emitted");

        Ok(Emission { particles, counts })
    }

    fn spawn<W, R>(&self, region: Region, at: &Landmark, world: &mut W, rng: &mut R) -> Particle
    where
        W: PhysicsWorld + ?Sized,
        R: Rng + ?Sized,
    {
        let p = &self.params;
        let spread = p.spread(region);
        let offset = Vec2::new(
            (rng.gen::<f32>() - 0.5) * spread,
            (rng.gen::<f32>() - 0.5) * spread,
        );
        let position = at.to_canvas(self.canvas) + offset;
        let size = uniform(rng, p.size_min, p.size_max);
        let life = uniform(rng, p.life_min, p.life_max);
        let velocity = Vec2::new(
            self.wind.sign() * uniform(rng, p.speed_min, p.speed_max),
            (rng.gen::<f32>() - 0.5) * p.vertical_range,
        );
        let color = DUST_COLORS[rng.gen_range(0..DUST_COLORS.len())];

        let body = world.add_circle(position, size, BodyParams {
            friction:     p.friction,
            air_friction: p.air_friction,
            restitution:  p.restitution,
            density:      uniform(rng, p.density_min, p.density_max),
        });
        world.set_velocity(body, velocity);

        Particle { position, velocity, size, life, color, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::fixtures::{full, hand, pose};
    use crate::physics::EulerWorld;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn emitter() -> ParticleEmitter {
        ParticleEmitter::from_config(&EffectConfig::dustbowl())
    }

    fn world() -> EulerWorld {
        EulerWorld::new(Vec2::ZERO)
    }

    #[test]
    fn all_regions_split_five_twelve_fifteen() {
        let counts = emitter().plan(&full(0), 1000).unwrap();
        assert_eq!(counts, RegionCounts { hands: 156, face: 375, body: 469 });
        assert_eq!(counts.total(), 1000);
    }

    #[test]
    fn invisible_face_is_excluded() {
        let snap = LandmarkSnapshot::empty(0).with_hand(hand()).with_body(pose(0.1, 0.9));
        let counts = emitter().plan(&snap, 1000).unwrap();
        assert_eq!(counts, RegionCounts { hands: 250, face: 0, body: 750 });
    }

    #[test]
    fn remainder_goes_to_face_without_body() {
        let snap = LandmarkSnapshot::empty(0).with_hand(hand()).with_body(pose(0.9, 0.2));
        let counts = emitter().plan(&snap, 1000).unwrap();
        assert_eq!(counts, RegionCounts { hands: 294, face: 706, body: 0 });
    }

    #[test]
    fn hands_only_take_everything() {
        let snap = LandmarkSnapshot::empty(0).with_hand(hand());
        let counts = emitter().plan(&snap, 350).unwrap();
        assert_eq!(counts, RegionCounts { hands: 350, face: 0, body: 0 });
    }

    #[test]
    fn face_mesh_stands_in_without_pose() {
        let mesh = vec![Landmark::new(0.5, 0.2); 5];
        let snap = LandmarkSnapshot::empty(0).with_face(mesh);
        let counts = emitter().plan(&snap, 100).unwrap();
        assert_eq!(counts.face, 100);
    }

    #[test]
    fn nothing_tracked_is_missing_data() {
        let err = emitter().plan(&LandmarkSnapshot::empty(0), 1000).unwrap_err();
        assert!(matches!(err, DustError::MissingData(_)));

        let invisible = LandmarkSnapshot::empty(0).with_body(pose(0.2, 0.2));
        let mut w = world();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(emitter().emit(&invisible, 1000, &mut w, &mut rng).is_err());
        assert_eq!(w.body_count(), 0);
    }

    #[test]
    fn emit_creates_one_body_per_particle() {
        let mut w = world();
        let mut rng = StdRng::seed_from_u64(7);
        let emission = emitter().emit(&full(0), 1000, &mut w, &mut rng).unwrap();
        assert_eq!(emission.particles.len(), 1000);
        assert_eq!(w.body_count(), 1000);
        assert_eq!(emission.counts.total(), 1000);
    }

    #[test]
    fn particles_respect_ranges_and_wind() {
        let mut w = world();
        let mut rng = StdRng::seed_from_u64(11);
        let emission = emitter().emit(&full(0), 500, &mut w, &mut rng).unwrap();
        for p in &emission.particles {
            assert!(p.size >= 1.5 && p.size < 5.5, "size {}", p.size);
            assert!(p.life >= 150.0 && p.life < 300.0, "life {}", p.life);
            assert!(p.velocity.x <= -1.0 && p.velocity.x > -4.0, "vx {}", p.velocity.x);
            assert!(p.velocity.y.abs() <= 1.25);
            assert!(DUST_COLORS.contains(&p.color));
            assert_eq!(w.position(p.body), Some(p.position));
        }
    }

    #[test]
    fn right_wind_pushes_right() {
        let cfg = EffectConfig::classic();
        let e = ParticleEmitter::from_config(&cfg);
        let mut w = world();
        let mut rng = StdRng::seed_from_u64(3);
        let emission = e.emit(&full(0), 200, &mut w, &mut rng).unwrap();
        assert!(emission.particles.iter().all(|p| p.velocity.x >= 0.5));
    }

    #[test]
    fn hand_particles_stay_near_hand() {
        let snap = LandmarkSnapshot::empty(0).with_hand(hand());
        let canvas = CanvasSize::default();
        let mut w = world();
        let mut rng = StdRng::seed_from_u64(5);
        let emission = emitter().emit(&snap, 300, &mut w, &mut rng).unwrap();
        let pts: Vec<Vec2> = hand().iter().map(|l| l.to_canvas(canvas)).collect();
        for p in &emission.particles {
            let near = pts.iter().any(|c| (p.position.x - c.x).abs() <= 50.0 && (p.position.y - c.y).abs() <= 50.0);
            assert!(near, "particle at {:?} far from every hand landmark", p.position);
        }
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let params = EmitterParams { size_min: 6.0, ..EmitterParams::default() };
        assert!(params.validate().is_err());
        assert!(RegionWeights { hands: 0, face: 0, body: 0 }.validate().is_err());
    }

    #[test]
    fn huge_weights_validate_without_overflow() {
        assert!(RegionWeights { hands: u32::MAX, face: 1, body: 0 }.validate().is_ok());
        assert!(RegionWeights { hands: u32::MAX, face: u32::MAX, body: u32::MAX }.validate().is_ok());

        let cfg = EffectConfig::from_toml_str("[weights]\nhands = 4294967295\nface = 1\nbody = 0\n").unwrap();
        assert_eq!(cfg.weights.hands, u32::MAX);
    }

    #[test]
    fn empty_hand_does_not_claim_a_share() {
        let mut snap = LandmarkSnapshot::empty(0).with_body(pose(0.9, 0.9));
        snap.hands.push(Vec::new());
        let counts = emitter().plan(&snap, 1000).unwrap();
        assert_eq!(counts.hands, 0);

        let mut w = world();
        let mut rng = StdRng::seed_from_u64(9);
        let emission = emitter().emit(&snap, 1000, &mut w, &mut rng).unwrap();
        assert_eq!(emission.particles.len(), 1000);
        assert_eq!(w.body_count(), 1000);
    }

    #[test]
    fn empty_hand_alone_is_missing_data() {
        let mut snap = LandmarkSnapshot::empty(0);
        snap.hands.push(Vec::new());
        assert!(matches!(emitter().plan(&snap, 100), Err(DustError::MissingData(_))));
    }

    #[test]
    fn classic_emits_from_hands_only() {
        let e = ParticleEmitter::from_config(&EffectConfig::classic());
        let counts = e.plan(&full(0), 350).unwrap();
        assert_eq!(counts, RegionCounts { hands: 350, face: 0, body: 0 });

        let body_only = LandmarkSnapshot::empty(0).with_body(pose(0.9, 0.9));
        assert!(matches!(e.plan(&body_only, 350), Err(DustError::MissingData(_))));
    }

    proptest! {
        #[test]
        fn counts_always_sum_to_total(
            total in 0usize..5000,
            with_hand in any::<bool>(),
            face_vis in prop_oneof![Just(0.1f32), Just(0.9f32)],
            body_vis in prop_oneof![Just(0.1f32), Just(0.9f32)],
            with_pose in any::<bool>(),
        ) {
            let mut snap = LandmarkSnapshot::empty(0);
            if with_hand { snap = snap.with_hand(hand()); }
            if with_pose { snap = snap.with_body(pose(face_vis, body_vis)); }
            let present = with_hand || (with_pose && (face_vis > 0.5 || body_vis > 0.5));
            match emitter().plan(&snap, total) {
                Ok(counts) => {
                    prop_assert!(present);
                    prop_assert_eq!(counts.total(), total);
                }
                Err(_) => prop_assert!(!present),
            }
        }
    }
}
