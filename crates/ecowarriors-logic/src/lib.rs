//! Pure simulation rules for Eco Warriors.
//!
//! This crate contains all game rules that are independent of storage,
//! rendering, physics backends or the frame loop. Functions take plain data
//! and return results, making them unit-testable and reusable from the
//! runtime crate, the headless harness and benchmarks alike.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`color`] | Hex RGB colors used by the derived visual tables |
//! | [`ecosystem`] | Biome identifiers, health/pollution state, the tick transform |
//! | [`inventory`] | Category/item/quantity bookkeeping with no zero entries |
//! | [`movement`] | Camera-relative movement vectors and look integration |
//! | [`progression`] | Experience, levels, skill points, stat counters, quests |
//! | [`quests`] | Static quest catalog and rewards |
//! | [`session`] | Session modes and the transition table |
//! | [`settings`] | Graphics/audio/control settings schema |
//! | [`visuals`] | Fog, lighting, particle density and alerts derived from state |

pub mod color;
pub mod ecosystem;
pub mod inventory;
pub mod movement;
pub mod progression;
pub mod quests;
pub mod session;
pub mod settings;
pub mod visuals;
