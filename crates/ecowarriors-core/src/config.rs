//! Runtime configuration.
//!
//! Every section and field has a default matching the shipped game, so an
//! empty JSON object (or no file at all) yields the stock configuration.

use std::path::{Path, PathBuf};

use ecowarriors_logic::ecosystem::{eco_constants, EcosystemId, EcosystemRates};
use ecowarriors_logic::movement::move_constants;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::persistence::DEFAULT_RECORD_NAME;

/// Which ecosystems advance on each simulator tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationScope {
    /// Only the ecosystem whose scene is active.
    #[default]
    Current,
    /// Every ecosystem, visible or not.
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds between ticks.
    pub tick_interval: f64,
    pub spread_rate: f64,
    pub restoration_rate: f64,
    pub scope: SimulationScope,
    /// Seed for the decorative particle field.
    pub particle_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: eco_constants::TICK_INTERVAL_SECS,
            spread_rate: eco_constants::POLLUTION_SPREAD_RATE,
            restoration_rate: eco_constants::RESTORATION_RATE,
            scope: SimulationScope::Current,
            particle_seed: 0x5EED_EC0,
        }
    }
}

impl SimulationConfig {
    pub fn rates(&self) -> EcosystemRates {
        EcosystemRates {
            spread_rate: self.spread_rate,
            restoration_rate: self.restoration_rate,
        }
    }

    /// Tick interval, falling back to the default for non-positive values.
    pub fn effective_interval(&self) -> f64 {
        if self.tick_interval.is_finite() && self.tick_interval > 0.0 {
            self.tick_interval
        } else {
            eco_constants::TICK_INTERVAL_SECS
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub jump_impulse: f32,
    /// Radians per pixel of pointer movement before sensitivity scaling.
    pub turn_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: move_constants::WALK_SPEED,
            run_speed: move_constants::RUN_SPEED,
            jump_impulse: move_constants::JUMP_IMPULSE,
            turn_speed: move_constants::TURN_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration (negative is down).
    pub gravity: f32,
    /// How far below the capsule's feet the ground probe reaches.
    pub probe_distance: f32,
    pub capsule_radius: f32,
    /// Half the height of the capsule's cylindrical section.
    pub capsule_half_height: f32,
    /// Height of the infinite ground plane.
    pub ground_height: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            probe_distance: 0.1,
            capsule_radius: 0.5,
            capsule_half_height: 0.5,
            ground_height: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Loading lasts at least this long even if the scene is ready earlier.
    pub min_loading_secs: f64,
    /// Scene entered on a new session.
    pub start_scene: EcosystemId,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_loading_secs: 2.0,
            start_scene: EcosystemId::Forest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Name of the durable record.
    pub record_name: String,
    /// Directory for file-backed storage. `None` keeps everything in memory.
    pub save_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            record_name: DEFAULT_RECORD_NAME.to_string(),
            save_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub adaptive_quality: bool,
    pub low_end: bool,
    /// Below this frame rate quality is reduced (capable devices only).
    pub low_fps: f32,
    /// Above this frame rate quality is restored (low-end devices only).
    pub high_fps: f32,
    /// Seconds of frames averaged per measurement.
    pub sample_secs: f32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            adaptive_quality: true,
            low_end: false,
            low_fps: 25.0,
            high_fps: 50.0,
            sample_secs: 1.0,
        }
    }
}

/// Top-level configuration for [`GameEngine`](crate::engine::GameEngine).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub simulation: SimulationConfig,
    pub player: PlayerConfig,
    pub physics: PhysicsConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub performance: PerformanceConfig,
}

impl GameConfig {
    /// Parse a JSON document. Missing fields use defaults.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = GameConfig::parse("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.storage.record_name, "eco-warriors-save");
        assert_eq!(config.session.min_loading_secs, 2.0);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config =
            GameConfig::parse(r#"{"simulation": {"scope": "all"}, "player": {"run_speed": 12.0}}"#)
                .unwrap();
        assert_eq!(config.simulation.scope, SimulationScope::All);
        assert_eq!(config.simulation.tick_interval, 1.0);
        assert_eq!(config.player.run_speed, 12.0);
        assert_eq!(config.player.walk_speed, 5.0);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = GameConfig::parse("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)), "got {err:?}");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::from_file("/definitely/not/here/eco.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)), "got {err:?}");
    }

    #[test]
    fn test_non_positive_interval_falls_back() {
        let mut sim = SimulationConfig::default();
        sim.tick_interval = 0.0;
        assert_eq!(sim.effective_interval(), 1.0);
        sim.tick_interval = 0.25;
        assert_eq!(sim.effective_interval(), 0.25);
    }
}
