//! Rendering inputs derived from ecosystem state.
//!
//! Everything here is a pure function of the current `(health, pollution)`
//! pair plus the static per-scene profile. The runtime recomputes these every
//! frame, so they always reflect the freshest numbers even though the numbers
//! themselves only change once per tick. Nothing here is persisted or fed
//! back into the simulation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::ecosystem::{EcosystemId, EcosystemState};

/// Thresholds and constants for the derived visuals.
pub mod visual_constants {
    /// Fog always starts at this distance.
    pub const FOG_NEAR: f32 = 10.0;
    /// Fog far distance at zero pollution.
    pub const FOG_FAR_CLEAR: f32 = 100.0;
    /// Fog far distance lost per pollution point.
    pub const FOG_FAR_PER_POLLUTION: f32 = 0.5;

    /// Particles spawned per pollution point.
    pub const PARTICLES_PER_POLLUTION: f64 = 2.0;
    /// Particle color switches to brown above this pollution.
    pub const PARTICLE_BROWN_THRESHOLD: f64 = 60.0;
    /// Particles glow red above this pollution.
    pub const PARTICLE_EMISSIVE_THRESHOLD: f64 = 80.0;

    /// Ground pollution markers appear above this pollution.
    pub const GROUND_MARKER_THRESHOLD: f64 = 30.0;
    /// Restoration markers appear above this health.
    pub const RESTORATION_MARKER_THRESHOLD: f64 = 70.0;

    /// Pollution above which the critical alert is raised.
    pub const CRITICAL_POLLUTION: f64 = 70.0;
    /// Health above which (with low pollution) the thriving notice is raised.
    pub const THRIVING_HEALTH: f64 = 80.0;
    /// Pollution below which (with high health) the thriving notice is raised.
    pub const THRIVING_POLLUTION: f64 = 20.0;

    /// Ambient light turns brown above this pollution.
    pub const AMBIENT_BROWN_THRESHOLD: f64 = 50.0;
}

/// Sky and sun tint, stepped on health.
pub fn sky_color(health: f64) -> Rgb {
    if health > 80.0 {
        Rgb::hex(0x87CEEB)
    } else if health > 60.0 {
        Rgb::hex(0x9ACD32)
    } else if health > 40.0 {
        Rgb::hex(0xDAA520)
    } else if health > 20.0 {
        Rgb::hex(0xFF8C00)
    } else {
        Rgb::hex(0x696969)
    }
}

/// Fog tint, stepped on pollution.
pub fn fog_color(pollution: f64) -> Rgb {
    if pollution < 20.0 {
        Rgb::hex(0xE0F2F1)
    } else if pollution < 40.0 {
        Rgb::hex(0xB2DFDB)
    } else if pollution < 60.0 {
        Rgb::hex(0x80CBC4)
    } else if pollution < 80.0 {
        Rgb::hex(0x4DB6AC)
    } else {
        Rgb::hex(0x26A69A)
    }
}

/// Fog far distance: visibility shrinks as pollution rises.
pub fn fog_far(pollution: f64) -> f32 {
    visual_constants::FOG_FAR_CLEAR - pollution as f32 * visual_constants::FOG_FAR_PER_POLLUTION
}

/// Number of airborne pollution particles.
pub fn particle_count(pollution: f64) -> usize {
    (pollution.max(0.0) * visual_constants::PARTICLES_PER_POLLUTION).floor() as usize
}

/// Health band shown in the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Thriving,
    Healthy,
    AtRisk,
    Endangered,
    Critical,
}

impl HealthStatus {
    pub fn from_health(health: f64) -> Self {
        if health > 80.0 {
            HealthStatus::Thriving
        } else if health > 60.0 {
            HealthStatus::Healthy
        } else if health > 40.0 {
            HealthStatus::AtRisk
        } else if health > 20.0 {
            HealthStatus::Endangered
        } else {
            HealthStatus::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Thriving => "Thriving",
            HealthStatus::Healthy => "Healthy",
            HealthStatus::AtRisk => "At Risk",
            HealthStatus::Endangered => "Endangered",
            HealthStatus::Critical => "Critical",
        }
    }
}

/// Pollution band shown in the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollutionStatus {
    Clean,
    Light,
    Moderate,
    Heavy,
    Severe,
}

impl PollutionStatus {
    pub fn from_pollution(pollution: f64) -> Self {
        if pollution < 20.0 {
            PollutionStatus::Clean
        } else if pollution < 40.0 {
            PollutionStatus::Light
        } else if pollution < 60.0 {
            PollutionStatus::Moderate
        } else if pollution < 80.0 {
            PollutionStatus::Heavy
        } else {
            PollutionStatus::Severe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PollutionStatus::Clean => "Clean",
            PollutionStatus::Light => "Light",
            PollutionStatus::Moderate => "Moderate",
            PollutionStatus::Heavy => "Heavy",
            PollutionStatus::Severe => "Severe",
        }
    }
}

/// Threshold conditions the UI turns into notifications.
///
/// These are level conditions: they hold for every frame the state is past
/// the threshold. Debouncing belongs to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EcoAlert {
    /// Pollution above 70.
    Critical,
    /// Health above 80 while pollution is below 20.
    Thriving,
}

/// Alerts whose condition currently holds.
pub fn active_alerts(state: &EcosystemState) -> Vec<EcoAlert> {
    use visual_constants::*;

    let mut alerts = Vec::new();
    if state.pollution() > CRITICAL_POLLUTION {
        alerts.push(EcoAlert::Critical);
    }
    if state.health() > THRIVING_HEALTH && state.pollution() < THRIVING_POLLUTION {
        alerts.push(EcoAlert::Thriving);
    }
    alerts
}

/// Static look of a scene before pollution is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneProfile {
    pub fog_color: Rgb,
    pub fog_near: f32,
    pub fog_far: f32,
    pub sun_color: Rgb,
    pub ambient_intensity: f32,
    /// Where the player body is placed on entering the scene.
    pub entry_point: Vec3,
}

/// Base profile for each ecosystem's scene.
pub fn scene_profile(id: EcosystemId) -> SceneProfile {
    let entry_point = Vec3::new(0.0, 5.0, 0.0);
    match id {
        EcosystemId::Forest => SceneProfile {
            fog_color: Rgb::hex(0x87CEEB),
            fog_near: 10.0,
            fog_far: 100.0,
            sun_color: Rgb::hex(0xFFD700),
            ambient_intensity: 0.4,
            entry_point,
        },
        EcosystemId::Ocean => SceneProfile {
            fog_color: Rgb::hex(0x006994),
            fog_near: 5.0,
            fog_far: 50.0,
            sun_color: Rgb::hex(0x87CEEB),
            ambient_intensity: 0.6,
            entry_point,
        },
        EcosystemId::Mountain => SceneProfile {
            fog_color: Rgb::hex(0xB0C4DE),
            fog_near: 20.0,
            fog_far: 150.0,
            sun_color: Rgb::hex(0xFFA500),
            ambient_intensity: 0.5,
            entry_point,
        },
        EcosystemId::Urban => SceneProfile {
            fog_color: Rgb::hex(0x696969),
            fog_near: 15.0,
            fog_far: 80.0,
            sun_color: Rgb::hex(0xF0E68C),
            ambient_intensity: 0.3,
            entry_point,
        },
    }
}

/// Everything a scene needs to draw the environment for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualParams {
    pub ecosystem: EcosystemId,
    pub sky_color: Rgb,
    pub sun_intensity: f32,
    pub fog_color: Rgb,
    pub fog_near: f32,
    pub fog_far: f32,
    pub ambient_color: Rgb,
    pub ambient_intensity: f32,
    pub particle_count: usize,
    pub particle_color: Rgb,
    pub particle_emissive: bool,
    pub ground_markers: usize,
    pub restoration_markers: usize,
    pub health_status: HealthStatus,
    pub pollution_status: PollutionStatus,
    pub alerts: Vec<EcoAlert>,
}

/// Derive the frame's visual parameters from an ecosystem state.
///
/// `particles_enabled` comes from the current quality tier; when false the
/// particle count is forced to zero.
pub fn derive_visuals(
    ecosystem: EcosystemId,
    state: &EcosystemState,
    particles_enabled: bool,
) -> VisualParams {
    use visual_constants::*;

    let health = state.health();
    let pollution = state.pollution();

    let ambient_color = if pollution > AMBIENT_BROWN_THRESHOLD {
        Rgb::hex(0x8B4513)
    } else {
        Rgb::WHITE
    };
    let particle_color = if pollution > PARTICLE_BROWN_THRESHOLD {
        Rgb::hex(0x8B4513)
    } else {
        Rgb::hex(0xA9A9A9)
    };

    VisualParams {
        ecosystem,
        sky_color: sky_color(health),
        sun_intensity: (0.5 + health / 200.0) as f32,
        fog_color: fog_color(pollution),
        fog_near: FOG_NEAR,
        fog_far: fog_far(pollution),
        ambient_color,
        ambient_intensity: (0.2 + health / 200.0 - pollution / 300.0).max(0.0) as f32,
        particle_count: if particles_enabled {
            particle_count(pollution)
        } else {
            0
        },
        particle_color,
        particle_emissive: pollution > PARTICLE_EMISSIVE_THRESHOLD,
        ground_markers: if pollution > GROUND_MARKER_THRESHOLD {
            (pollution / 10.0).floor() as usize
        } else {
            0
        },
        restoration_markers: if health > RESTORATION_MARKER_THRESHOLD {
            (health / 20.0).floor() as usize
        } else {
            0
        },
        health_status: HealthStatus::from_health(health),
        pollution_status: PollutionStatus::from_pollution(pollution),
        alerts: active_alerts(state),
    }
}
