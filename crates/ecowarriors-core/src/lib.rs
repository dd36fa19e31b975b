//! Eco Warriors Core - runtime for the eco-exploration game
//!
//! Owns the authoritative game state and everything that advances it each
//! frame: the persistent store, the fixed-interval ecosystem simulator, the
//! first-person player controller and the session state machine. Rendering,
//! physics and audio devices are host collaborators behind traits.
//!
//! # Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`store`] | Single source of truth, change notifications, batched saves |
//! | [`persistence`] | Save record schema, storage backends, binary snapshots |
//! | [`simulator`] | Fixed-interval ecosystem ticks driven by frame time |
//! | [`controller`] | Keyboard/pointer input to movement, jumps and look |
//! | [`input`] | Held keys, jump latch and pointer capture |
//! | [`physics`] | Physics backend trait and a kinematic capsule world |
//! | [`session`] | Menu/loading/playing/paused orchestration |
//! | [`particles`] | Pollution particle field (hecs world) |
//! | [`audio`] | Cue playback routed through category volumes |
//! | [`performance`] | Frame-rate sampling and adaptive quality |
//! | [`ui`] | Panel toggles, notifications and UI intents |
//! | [`scene`] | Scene preparation/rendering collaborator |
//! | [`engine`] | The frame loop tying it all together |
//!
//! # Example
//!
//! ```rust,no_run
//! use ecowarriors_core::prelude::*;
//!
//! let mut engine = GameEngine::new(GameConfig::default());
//! engine.dispatch(Intent::StartGame);
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod audio;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod input;
pub mod particles;
pub mod performance;
pub mod persistence;
pub mod physics;
pub mod scene;
pub mod session;
pub mod simulator;
pub mod store;
pub mod ui;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::config::GameConfig;
    pub use crate::engine::{FrameReport, GameEngine};
    pub use crate::input::KeyCode;
    pub use crate::store::{Change, GameState, PersistentStore};
    pub use crate::ui::Intent;
    pub use ecowarriors_logic::ecosystem::EcosystemId;
    pub use ecowarriors_logic::session::SessionMode;
}
