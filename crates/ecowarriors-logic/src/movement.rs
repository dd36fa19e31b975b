//! Pure first-person movement math.
//!
//! Algorithm: "project then scale"
//! 1. Build the camera's forward vector from yaw and pitch
//! 2. Project the gravity axis out and renormalize (falls back to yaw-only
//!    forward when looking straight up or down)
//! 3. Right = forward x up
//! 4. Combine with the intent axes, normalize diagonals to unit length
//! 5. Scale by walk or run speed

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Movement tuning defaults.
pub mod move_constants {
    /// Walking speed in units per second.
    pub const WALK_SPEED: f32 = 5.0;
    /// Running speed in units per second.
    pub const RUN_SPEED: f32 = 10.0;
    /// Vertical velocity added by a jump.
    pub const JUMP_IMPULSE: f32 = 8.0;
    /// Radians of rotation per pixel of pointer movement.
    pub const TURN_SPEED: f32 = 0.003;
}

/// Movement-intent bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveIntent(u8);

impl MoveIntent {
    pub const FORWARD: MoveIntent = MoveIntent(1 << 0);
    pub const BACK: MoveIntent = MoveIntent(1 << 1);
    pub const LEFT: MoveIntent = MoveIntent(1 << 2);
    pub const RIGHT: MoveIntent = MoveIntent(1 << 3);

    pub const fn empty() -> Self {
        MoveIntent(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: MoveIntent) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: MoveIntent) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: MoveIntent) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Intent as (strafe, advance) axes in `[-1, 1]`, diagonals normalized.
    /// Opposite keys cancel.
    pub fn axes(self) -> (f32, f32) {
        let mut strafe = 0.0f32;
        let mut advance = 0.0f32;
        if self.contains(MoveIntent::FORWARD) {
            advance += 1.0;
        }
        if self.contains(MoveIntent::BACK) {
            advance -= 1.0;
        }
        if self.contains(MoveIntent::LEFT) {
            strafe -= 1.0;
        }
        if self.contains(MoveIntent::RIGHT) {
            strafe += 1.0;
        }
        if strafe != 0.0 && advance != 0.0 {
            let len = (strafe * strafe + advance * advance).sqrt();
            strafe /= len;
            advance /= len;
        }
        (strafe, advance)
    }
}

impl std::ops::BitOr for MoveIntent {
    type Output = MoveIntent;

    fn bitor(self, rhs: MoveIntent) -> MoveIntent {
        MoveIntent(self.0 | rhs.0)
    }
}

/// Accumulated camera orientation. No inertia: each delta is applied
/// directly to the angles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LookAngles {
    /// Rotation about the vertical axis, wrapped into (-pi, pi].
    pub yaw: f32,
    /// Rotation about the camera's right axis, clamped to [-pi/2, pi/2].
    pub pitch: f32,
}

impl LookAngles {
    /// Apply a pointer delta (pixels). Moving the pointer right turns right,
    /// moving it down looks down unless `invert_y`.
    pub fn apply_delta(&mut self, dx: f32, dy: f32, turn_speed: f32, invert_y: bool) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        let dy = if invert_y { -dy } else { dy };
        self.yaw = wrap_angle(self.yaw - dx * turn_speed);
        self.pitch = (self.pitch - dy * turn_speed).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Euler rotation in (x = pitch, y = yaw, z = roll) order.
    pub fn to_euler(self) -> Vec3 {
        Vec3::new(self.pitch, self.yaw, 0.0)
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

/// Wrap an angle into (-pi, pi].
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = (angle + PI).rem_euclid(TAU) - PI;
    if a <= -PI {
        a += TAU;
    }
    a
}

/// Ground-plane forward and right vectors for a camera orientation.
pub fn camera_basis(look: LookAngles) -> (Vec3, Vec3) {
    let full_forward = look.to_quat() * Vec3::NEG_Z;
    let flat = Vec3::new(full_forward.x, 0.0, full_forward.z);
    // Near-vertical views leave only rounding noise in the flat vector.
    let forward = if flat.length_squared() > 1e-6 {
        flat.normalize()
    } else {
        Quat::from_rotation_y(look.yaw) * Vec3::NEG_Z
    };
    let right = forward.cross(Vec3::Y);
    (forward, right)
}

/// Horizontal velocity (units/second) for an intent and orientation.
pub fn movement_velocity(
    intent: MoveIntent,
    look: LookAngles,
    run: bool,
    walk_speed: f32,
    run_speed: f32,
) -> Vec3 {
    let (strafe, advance) = intent.axes();
    if strafe == 0.0 && advance == 0.0 {
        return Vec3::ZERO;
    }
    let speed = if run { run_speed } else { walk_speed };
    let (forward, right) = camera_basis(look);
    (forward * advance + right * strafe) * speed
}
