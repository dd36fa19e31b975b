//! Per-biome health/pollution model and the fixed-cadence tick transform.
//!
//! Each ecosystem carries two numbers in `[0, 100]`: `health` (higher is
//! better) and `pollution` (higher is worse). One tick applies, in order:
//!
//! 1. Pollution self-growth proportional to its own level.
//! 2. Health decay stepped on pollution thresholds.
//! 3. Slow natural restoration while pollution is low.
//! 4. Clamp both fields.
//!
//! Steps 1-3 all read the pollution value captured at tick start, so the
//! effects of one tick are simultaneous rather than sequential.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tuning constants for the ecosystem tick.
pub mod eco_constants {
    /// Lower bound for health and pollution.
    pub const MIN_LEVEL: f64 = 0.0;
    /// Upper bound for health and pollution.
    pub const MAX_LEVEL: f64 = 100.0;

    /// Pollution growth per tick at 100% pollution.
    pub const POLLUTION_SPREAD_RATE: f64 = 0.1;
    /// Health and pollution recovery per tick while pollution is low.
    pub const RESTORATION_RATE: f64 = 0.05;

    /// Above this pollution, health takes the heavy decay.
    pub const HEAVY_DECAY_THRESHOLD: f64 = 50.0;
    /// Above this pollution (and not above heavy), health takes the light decay.
    pub const LIGHT_DECAY_THRESHOLD: f64 = 30.0;
    /// Health lost per tick under heavy pollution.
    pub const HEAVY_DECAY: f64 = 0.5;
    /// Health lost per tick under moderate pollution.
    pub const LIGHT_DECAY: f64 = 0.2;
    /// Below this pollution, natural restoration runs.
    pub const RESTORATION_THRESHOLD: f64 = 20.0;

    /// Simulated seconds between ticks.
    pub const TICK_INTERVAL_SECS: f64 = 1.0;
}

/// The four biome simulation contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcosystemId {
    Forest,
    Ocean,
    Mountain,
    Urban,
}

impl EcosystemId {
    /// All ecosystems in scene order.
    pub const ALL: [EcosystemId; 4] = [
        EcosystemId::Forest,
        EcosystemId::Ocean,
        EcosystemId::Mountain,
        EcosystemId::Urban,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EcosystemId::Forest => "forest",
            EcosystemId::Ocean => "ocean",
            EcosystemId::Mountain => "mountain",
            EcosystemId::Urban => "urban",
        }
    }

    /// Health/pollution every new game starts with.
    pub fn initial_state(self) -> EcosystemState {
        match self {
            EcosystemId::Forest => EcosystemState::new(75.0, 25.0),
            EcosystemId::Ocean => EcosystemState::new(60.0, 40.0),
            EcosystemId::Mountain => EcosystemState::new(80.0, 20.0),
            EcosystemId::Urban => EcosystemState::new(45.0, 55.0),
        }
    }
}

impl fmt::Display for EcosystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no ecosystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ecosystem: {0}")]
pub struct UnknownEcosystem(pub String);

impl FromStr for EcosystemId {
    type Err = UnknownEcosystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EcosystemId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownEcosystem(s.to_string()))
    }
}

/// Health and pollution of one ecosystem. Both always lie in `[0, 100]`.
///
/// Only [`EcosystemState::new`] builds one, so nothing can skip the clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EcosystemState {
    health: f64,
    pollution: f64,
}

impl EcosystemState {
    /// Build a state, clamping both values into range. NaN becomes 0.
    pub fn new(health: f64, pollution: f64) -> Self {
        Self {
            health: clamp_level(health),
            pollution: clamp_level(pollution),
        }
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn pollution(&self) -> f64 {
        self.pollution
    }
}

/// Clamp a level into `[0, 100]`, mapping NaN to the lower bound.
pub fn clamp_level(value: f64) -> f64 {
    if value.is_nan() {
        return eco_constants::MIN_LEVEL;
    }
    value.clamp(eco_constants::MIN_LEVEL, eco_constants::MAX_LEVEL)
}

/// Rates used by [`tick_ecosystem`]. Defaults match the shipped game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcosystemRates {
    pub spread_rate: f64,
    pub restoration_rate: f64,
}

impl Default for EcosystemRates {
    fn default() -> Self {
        Self {
            spread_rate: eco_constants::POLLUTION_SPREAD_RATE,
            restoration_rate: eco_constants::RESTORATION_RATE,
        }
    }
}

/// Apply one tick of the ecosystem transform.
pub fn tick_ecosystem(state: EcosystemState, rates: &EcosystemRates) -> EcosystemState {
    use eco_constants::*;

    let p0 = state.pollution;
    let mut pollution = p0;
    let mut health = state.health;

    pollution += rates.spread_rate * (p0 / 100.0);

    if p0 > HEAVY_DECAY_THRESHOLD {
        health -= HEAVY_DECAY;
    } else if p0 > LIGHT_DECAY_THRESHOLD {
        health -= LIGHT_DECAY;
    }

    if p0 < RESTORATION_THRESHOLD {
        health += rates.restoration_rate;
        pollution -= rates.restoration_rate;
    }

    EcosystemState::new(health, pollution)
}

/// Fresh table of every ecosystem at its initial state.
pub fn initial_ecosystems() -> BTreeMap<EcosystemId, EcosystemState> {
    EcosystemId::ALL
        .into_iter()
        .map(|id| (id, id.initial_state()))
        .collect()
}
