//! Decorative pollution particles.
//!
//! Each particle is an entity in a `hecs` world doing an independent bounded
//! random walk. The field only mirrors the derived particle count; nothing
//! here ever feeds back into ecosystem state.

use glam::Vec3;
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bounds of the particle volume.
pub mod particle_constants {
    /// Particles reflect once |x| or |z| exceeds this.
    pub const HALF_EXTENT: f32 = 50.0;
    /// Horizontal positions are scaled by this on reflection.
    pub const REFLECT_FACTOR: f32 = -0.9;
    /// Particles rising past this wrap to the floor.
    pub const CEILING: f32 = 25.0;
    /// Spawn height range upper bound.
    pub const SPAWN_HEIGHT: f32 = 20.0;
    /// Amplitude of the vertical wave added each update.
    pub const WAVE_AMPLITUDE: f32 = 0.01;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticlePosition(pub Vec3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleVelocity(pub Vec3);

/// Render-only appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleLook {
    pub size: f32,
    pub opacity: f32,
}

pub struct ParticleField {
    world: World,
    entities: Vec<Entity>,
    rng: StdRng,
    elapsed: f32,
}

impl ParticleField {
    pub fn new(seed: u64) -> Self {
        Self {
            world: World::new(),
            entities: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            elapsed: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Spawn or despawn the difference so exactly `target` particles exist.
    /// Surviving particles keep their positions.
    pub fn sync_count(&mut self, target: usize) {
        while self.entities.len() > target {
            if let Some(entity) = self.entities.pop() {
                let _ = self.world.despawn(entity);
            }
        }
        while self.entities.len() < target {
            let components = self.random_particle();
            let entity = self.world.spawn(components);
            self.entities.push(entity);
        }
    }

    fn random_particle(&mut self) -> (ParticlePosition, ParticleVelocity, ParticleLook) {
        use particle_constants::*;
        let rng = &mut self.rng;
        let position = Vec3::new(
            rng.gen_range(-HALF_EXTENT..HALF_EXTENT),
            rng.gen_range(0.0..SPAWN_HEIGHT),
            rng.gen_range(-HALF_EXTENT..HALF_EXTENT),
        );
        let velocity = Vec3::new(
            rng.gen_range(-0.25..0.25),
            rng.gen_range(0.0..0.2),
            rng.gen_range(-0.25..0.25),
        );
        let look = ParticleLook {
            size: rng.gen_range(0.5..2.0),
            opacity: rng.gen_range(0.3..0.7),
        };
        (ParticlePosition(position), ParticleVelocity(velocity), look)
    }

    /// Advance every particle by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        self.elapsed += dt;
        let t = self.elapsed;
        for (_, (pos, vel)) in self
            .world
            .query_mut::<(&mut ParticlePosition, &ParticleVelocity)>()
        {
            pos.0 = step_particle(pos.0, vel.0, dt, t);
        }
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.entities
            .iter()
            .filter_map(|&e| self.world.get::<&ParticlePosition>(e).ok().map(|p| p.0))
            .collect()
    }

    /// Particles with their appearance, for a renderer.
    pub fn snapshot(&self) -> Vec<(Vec3, ParticleLook)> {
        self.world
            .query::<(&ParticlePosition, &ParticleLook)>()
            .iter()
            .map(|(_, (p, look))| (p.0, *look))
            .collect()
    }

    pub fn clear(&mut self) {
        self.world.clear();
        self.entities.clear();
        self.elapsed = 0.0;
    }
}

/// One step of the walk: drift, vertical wave, then wrap into bounds.
pub fn step_particle(mut pos: Vec3, vel: Vec3, dt: f32, t: f32) -> Vec3 {
    use particle_constants::*;

    pos += vel * dt;
    pos.y += (t + pos.x).sin() * WAVE_AMPLITUDE;

    if pos.x.abs() > HALF_EXTENT {
        pos.x *= REFLECT_FACTOR;
    }
    if pos.z.abs() > HALF_EXTENT {
        pos.z *= REFLECT_FACTOR;
    }
    if pos.y > CEILING {
        pos.y = 0.0;
    }
    if pos.y < 0.0 {
        pos.y = CEILING;
    }
    pos
}
