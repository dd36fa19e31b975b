//! Keyboard and pointer input surface.
//!
//! The host feeds raw key edges and pointer deltas; the controller reads the
//! resulting intent once per frame. Holding state is tracked per key so that
//! releasing `W` while `ArrowUp` is still held keeps moving forward.

use std::collections::BTreeSet;
use std::str::FromStr;

use ecowarriors_logic::movement::MoveIntent;
use glam::Vec2;

/// Keys the game reacts to, named after DOM `KeyboardEvent.code` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyCode {
    KeyW,
    KeyA,
    KeyS,
    KeyD,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    ShiftLeft,
    ShiftRight,
    Escape,
    Tab,
    KeyI,
    KeyJ,
    KeyM,
}

impl KeyCode {
    pub const ALL: [KeyCode; 16] = [
        KeyCode::KeyW,
        KeyCode::KeyA,
        KeyCode::KeyS,
        KeyCode::KeyD,
        KeyCode::ArrowUp,
        KeyCode::ArrowDown,
        KeyCode::ArrowLeft,
        KeyCode::ArrowRight,
        KeyCode::Space,
        KeyCode::ShiftLeft,
        KeyCode::ShiftRight,
        KeyCode::Escape,
        KeyCode::Tab,
        KeyCode::KeyI,
        KeyCode::KeyJ,
        KeyCode::KeyM,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KeyCode::KeyW => "KeyW",
            KeyCode::KeyA => "KeyA",
            KeyCode::KeyS => "KeyS",
            KeyCode::KeyD => "KeyD",
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::Space => "Space",
            KeyCode::ShiftLeft => "ShiftLeft",
            KeyCode::ShiftRight => "ShiftRight",
            KeyCode::Escape => "Escape",
            KeyCode::Tab => "Tab",
            KeyCode::KeyI => "KeyI",
            KeyCode::KeyJ => "KeyJ",
            KeyCode::KeyM => "KeyM",
        }
    }

    /// Movement direction bound to this key, if any.
    pub fn move_intent(self) -> Option<MoveIntent> {
        match self {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(MoveIntent::FORWARD),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(MoveIntent::BACK),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(MoveIntent::LEFT),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(MoveIntent::RIGHT),
            _ => None,
        }
    }

    pub fn is_run(self) -> bool {
        matches!(self, KeyCode::ShiftLeft | KeyCode::ShiftRight)
    }
}

impl FromStr for KeyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyCode::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown key code: {s}"))
    }
}

/// Per-frame input snapshot source for the player controller.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: BTreeSet<KeyCode>,
    jump_latched: bool,
    pointer_captured: bool,
    look_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns false for auto-repeat of a held key.
    pub fn key_down(&mut self, key: KeyCode) -> bool {
        if !self.held.insert(key) {
            return false;
        }
        if key == KeyCode::Space {
            self.jump_latched = true;
        }
        true
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Pointer movement in pixels. Ignored unless the pointer is captured.
    pub fn pointer_delta(&mut self, dx: f32, dy: f32) {
        if !self.pointer_captured || !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.look_delta += Vec2::new(dx, dy);
    }

    pub fn set_pointer_captured(&mut self, captured: bool) {
        self.pointer_captured = captured;
        if !captured {
            self.look_delta = Vec2::ZERO;
        }
    }

    pub fn pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    /// Current movement intent from all held direction keys.
    pub fn intent(&self) -> MoveIntent {
        self.held
            .iter()
            .filter_map(|k| k.move_intent())
            .fold(MoveIntent::empty(), |acc, i| acc | i)
    }

    pub fn running(&self) -> bool {
        self.held.iter().any(|k| k.is_run())
    }

    /// Consume the latched jump press.
    pub fn take_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_latched)
    }

    /// Consume the pointer movement accumulated since the last frame.
    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    /// Release everything (pause, focus loss). Pointer capture is kept.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.jump_latched = false;
        self.look_delta = Vec2::ZERO;
    }
}
