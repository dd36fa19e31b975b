//! Physics backend seam and the built-in kinematic world.
//!
//! The controller only talks to [`PhysicsBackend`]. [`KinematicWorld`] is the
//! shipped implementation: a single capsule character (approximated by its
//! bounding box) under gravity, an infinite ground plane and static
//! axis-aligned boxes. Collision is resolved one axis at a time (X, Z, then
//! Y): a blocked axis is clamped to the obstacle's face and its velocity
//! zeroed while the other axes keep moving, which yields wall sliding.

use glam::Vec3;

use crate::config::PhysicsConfig;

/// Gap kept between the character and a surface it was pushed out of.
const SKIN: f32 = 1e-4;

/// What the player controller needs from a physics engine.
pub trait PhysicsBackend {
    /// Advance the world by `dt` seconds.
    fn step(&mut self, dt: f32);
    /// Desired horizontal velocity for the next step. The vertical
    /// component is ignored; gravity and impulses own it.
    fn move_character(&mut self, velocity: Vec3);
    /// Instant change of velocity.
    fn apply_impulse(&mut self, impulse: Vec3);
    /// True when walkable ground lies within probe distance below the feet.
    fn ground_probe(&self) -> bool;
    /// Character centre.
    fn position(&self) -> Vec3;
    /// Place the character, clearing its velocity.
    fn teleport(&mut self, position: Vec3);
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Strict overlap; touching faces do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    fn overlaps_footprint(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone)]
pub struct KinematicWorld {
    position: Vec3,
    velocity: Vec3,
    desired: Vec3,
    half_extents: Vec3,
    gravity: f32,
    ground_height: f32,
    probe_distance: f32,
    colliders: Vec<Aabb>,
}

impl Default for KinematicWorld {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl KinematicWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        let radius = config.capsule_radius.max(0.01);
        let half_height = config.capsule_half_height.max(0.0) + radius;
        Self {
            position: Vec3::new(0.0, config.ground_height + half_height, 0.0),
            velocity: Vec3::ZERO,
            desired: Vec3::ZERO,
            half_extents: Vec3::new(radius, half_height, radius),
            gravity: config.gravity,
            ground_height: config.ground_height,
            probe_distance: config.probe_distance.max(0.0),
            colliders: Vec::new(),
        }
    }

    /// Add a static box obstacle.
    pub fn add_box(&mut self, collider: Aabb) {
        self.colliders.push(collider);
    }

    pub fn colliders(&self) -> &[Aabb] {
        &self.colliders
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Distance from the centre down to the feet.
    pub fn foot_offset(&self) -> f32 {
        self.half_extents.y
    }

    fn bounds_at(&self, position: Vec3) -> Aabb {
        Aabb::from_center(position, self.half_extents)
    }

    fn move_axis(&mut self, axis: Axis, delta: f32) {
        if delta == 0.0 {
            return;
        }
        let mut next = self.position;
        match axis {
            Axis::X => next.x += delta,
            Axis::Y => next.y += delta,
            Axis::Z => next.z += delta,
        }

        let bounds = self.bounds_at(next);
        let half = self.half_extents;
        for collider in &self.colliders {
            if !bounds.overlaps(collider) {
                continue;
            }
            match axis {
                Axis::X => {
                    next.x = if delta > 0.0 {
                        collider.min.x - half.x - SKIN
                    } else {
                        collider.max.x + half.x + SKIN
                    };
                    self.velocity.x = 0.0;
                }
                Axis::Z => {
                    next.z = if delta > 0.0 {
                        collider.min.z - half.z - SKIN
                    } else {
                        collider.max.z + half.z + SKIN
                    };
                    self.velocity.z = 0.0;
                }
                Axis::Y => {
                    next.y = if delta > 0.0 {
                        collider.min.y - half.y - SKIN
                    } else {
                        collider.max.y + half.y + SKIN
                    };
                    self.velocity.y = 0.0;
                }
            }
            break;
        }

        if axis == Axis::Y {
            let floor = self.ground_height + half.y;
            if next.y < floor {
                next.y = floor;
                self.velocity.y = self.velocity.y.max(0.0);
            }
        }
        self.position = next;
    }
}

impl PhysicsBackend for KinematicWorld {
    fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        self.velocity.x = self.desired.x;
        self.velocity.z = self.desired.z;
        self.velocity.y += self.gravity * dt;

        self.move_axis(Axis::X, self.velocity.x * dt);
        self.move_axis(Axis::Z, self.velocity.z * dt);
        self.move_axis(Axis::Y, self.velocity.y * dt);
    }

    fn move_character(&mut self, velocity: Vec3) {
        if velocity.is_finite() {
            self.desired = Vec3::new(velocity.x, 0.0, velocity.z);
        }
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        if impulse.is_finite() {
            self.velocity += impulse;
        }
    }

    fn ground_probe(&self) -> bool {
        let feet = self.position.y - self.half_extents.y;
        let within = |surface: f32| {
            let gap = feet - surface;
            gap >= -2.0 * SKIN && gap <= self.probe_distance
        };
        if within(self.ground_height) {
            return true;
        }
        let footprint = self.bounds_at(self.position);
        self.colliders
            .iter()
            .any(|c| footprint.overlaps_footprint(c) && within(c.max.y))
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn teleport(&mut self, position: Vec3) {
        if position.is_finite() {
            self.position = position;
            self.velocity = Vec3::ZERO;
            self.desired = Vec3::ZERO;
        }
    }
}
