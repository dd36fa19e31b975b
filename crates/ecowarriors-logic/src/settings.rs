//! Player-facing settings: graphics, audio, controls.
//!
//! The serialized shape (camelCase keys grouped by category) is also the
//! addressing scheme for `update_setting(category, key, value)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Graphics quality tier picked in the settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Ultra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphicsSettings {
    pub quality: QualityTier,
    pub shadows: bool,
    pub antialiasing: bool,
    pub particles: bool,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            quality: QualityTier::High,
            shadows: true,
            antialiasing: true,
            particles: true,
        }
    }
}

/// Mixer channels. `Master` scales the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCategory {
    Master,
    Music,
    Sfx,
    Voice,
}

impl AudioCategory {
    pub const ALL: [AudioCategory; 4] = [
        AudioCategory::Master,
        AudioCategory::Music,
        AudioCategory::Sfx,
        AudioCategory::Voice,
    ];

    /// Settings key holding this channel's volume.
    pub fn settings_key(self) -> &'static str {
        match self {
            AudioCategory::Master => "masterVolume",
            AudioCategory::Music => "musicVolume",
            AudioCategory::Sfx => "sfxVolume",
            AudioCategory::Voice => "voiceVolume",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioSettings {
    pub master_volume: f32,
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub voice_volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            music_volume: 0.6,
            sfx_volume: 0.8,
            voice_volume: 0.7,
        }
    }
}

impl AudioSettings {
    pub fn volume(&self, category: AudioCategory) -> f32 {
        match category {
            AudioCategory::Master => self.master_volume,
            AudioCategory::Music => self.music_volume,
            AudioCategory::Sfx => self.sfx_volume,
            AudioCategory::Voice => self.voice_volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlSettings {
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
    pub key_bindings: BTreeMap<String, String>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 1.0,
            invert_y: false,
            key_bindings: BTreeMap::new(),
        }
    }
}

/// Range the settings menu allows for mouse sensitivity.
pub const SENSITIVITY_RANGE: (f32, f32) = (0.5, 2.0);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub graphics: GraphicsSettings,
    pub audio: AudioSettings,
    pub controls: ControlSettings,
}

impl Settings {
    /// Clamp numeric fields into the ranges the menus allow. Non-finite
    /// values fall back to defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = AudioSettings::default();
        let volume = |v: f32, fallback: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { fallback };
        self.audio.master_volume = volume(self.audio.master_volume, defaults.master_volume);
        self.audio.music_volume = volume(self.audio.music_volume, defaults.music_volume);
        self.audio.sfx_volume = volume(self.audio.sfx_volume, defaults.sfx_volume);
        self.audio.voice_volume = volume(self.audio.voice_volume, defaults.voice_volume);

        let (lo, hi) = SENSITIVITY_RANGE;
        self.controls.mouse_sensitivity = if self.controls.mouse_sensitivity.is_finite() {
            self.controls.mouse_sensitivity.clamp(lo, hi)
        } else {
            ControlSettings::default().mouse_sensitivity
        };
        self
    }
}
