//! First-person player controller.
//!
//! Runs once per render frame while playing:
//!
//! 1. Apply the pointer delta to the look angles.
//! 2. Hand the camera-relative walk/run velocity to the physics backend.
//! 3. Jump if grounded and a jump press is latched.
//! 4. Step the physics world.
//! 5. Probe for ground (skipped on the frame a jump was issued).
//! 6. Publish the pose to the store.

use ecowarriors_logic::movement::{movement_velocity, LookAngles};
use ecowarriors_logic::settings::ControlSettings;
use glam::Vec3;
use log::debug;

use crate::config::PlayerConfig;
use crate::input::InputState;
use crate::physics::PhysicsBackend;
use crate::store::{PersistentStore, PlayerPose};

#[derive(Debug, Clone)]
pub struct PlayerController {
    config: PlayerConfig,
    look: LookAngles,
    grounded: bool,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}

impl PlayerController {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            look: LookAngles::default(),
            grounded: false,
        }
    }

    pub fn look(&self) -> LookAngles {
        self.look
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Run one frame. Returns the new pose, or `None` without a physics
    /// backend (input edges are still drained so they do not replay later).
    pub fn update(
        &mut self,
        dt: f32,
        input: &mut InputState,
        physics: Option<&mut dyn PhysicsBackend>,
        controls: &ControlSettings,
        store: &mut PersistentStore,
    ) -> Option<PlayerPose> {
        let look_delta = input.take_look_delta();
        let jump_pressed = input.take_jump();
        let physics = physics?;
        if !(dt.is_finite() && dt > 0.0) {
            return None;
        }

        let turn_speed = self.config.turn_speed * controls.mouse_sensitivity;
        self.look
            .apply_delta(look_delta.x, look_delta.y, turn_speed, controls.invert_y);

        let velocity = movement_velocity(
            input.intent(),
            self.look,
            input.running(),
            self.config.walk_speed,
            self.config.run_speed,
        );
        physics.move_character(velocity);

        let jumped = jump_pressed && self.grounded;
        if jumped {
            physics.apply_impulse(Vec3::Y * self.config.jump_impulse);
            self.grounded = false;
            debug!("Jump from {:?}", physics.position());
        }

        physics.step(dt);

        if !jumped {
            self.grounded = physics.ground_probe();
        }

        let pose = self.pose(physics.position());
        store.set_player_pose(pose);
        Some(pose)
    }

    /// Place the player at `position` facing the default direction, e.g. on
    /// entering a scene.
    pub fn reset_to(
        &mut self,
        position: Vec3,
        physics: Option<&mut dyn PhysicsBackend>,
        store: &mut PersistentStore,
    ) {
        self.look = LookAngles::default();
        self.grounded = false;
        let position = match physics {
            Some(physics) => {
                physics.teleport(position);
                physics.position()
            }
            None => position,
        };
        store.set_player_pose(self.pose(position));
    }

    fn pose(&self, position: Vec3) -> PlayerPose {
        PlayerPose {
            position,
            rotation: self.look.to_euler(),
        }
    }
}
