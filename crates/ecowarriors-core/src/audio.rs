//! Audio service: named cues routed through category volumes.
//!
//! Playback itself happens in an [`AudioBackend`] supplied by the host.
//! Without one every call is a silent no-op.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use ecowarriors_logic::ecosystem::EcosystemId;
use ecowarriors_logic::settings::{AudioCategory, AudioSettings};
use log::{debug, info};

/// Cue names the engine plays.
pub mod cues {
    use ecowarriors_logic::ecosystem::EcosystemId;

    pub const CRITICAL_ALERT: &str = "alert-critical";
    pub const THRIVING_NOTICE: &str = "notice-thriving";
    pub const LEVEL_UP: &str = "level-up";
    pub const QUEST_COMPLETE: &str = "quest-complete";

    /// Looping ambience for a scene.
    pub fn ambient(ecosystem: EcosystemId) -> String {
        format!("ambient-{}", ecosystem.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueOptions {
    /// Per-cue gain in `[0, 1]`, applied before the category volume.
    pub volume: f32,
    pub looped: bool,
    pub category: AudioCategory,
}

impl Default for CueOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looped: false,
            category: AudioCategory::Sfx,
        }
    }
}

/// Host audio device.
pub trait AudioBackend {
    fn play_cue(&mut self, name: &str, options: &CueOptions);
    fn stop_cue(&mut self, name: &str);
    fn set_category_volume(&mut self, category: AudioCategory, volume: f32);
}

pub struct AudioService {
    backend: Option<Box<dyn AudioBackend>>,
    volumes: BTreeMap<AudioCategory, f32>,
    looping: BTreeSet<String>,
    ambient: Option<String>,
}

impl std::fmt::Debug for AudioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioService")
            .field("has_backend", &self.backend.is_some())
            .field("volumes", &self.volumes)
            .field("looping", &self.looping)
            .finish()
    }
}

impl AudioService {
    /// Create the service and push the initial category volumes.
    pub fn create(backend: Option<Box<dyn AudioBackend>>, settings: &AudioSettings) -> Self {
        if backend.is_none() {
            info!("No audio backend, audio disabled");
        }
        let mut service = Self {
            backend,
            volumes: BTreeMap::new(),
            looping: BTreeSet::new(),
            ambient: None,
        };
        service.sync_settings(settings);
        service
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn volume(&self, category: AudioCategory) -> f32 {
        self.volumes.get(&category).copied().unwrap_or(0.0)
    }

    /// Set a category volume, clamped into `[0, 1]`.
    pub fn set_category_volume(&mut self, category: AudioCategory, volume: f32) {
        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        if self.volumes.get(&category) == Some(&volume) {
            return;
        }
        self.volumes.insert(category, volume);
        if let Some(backend) = self.backend.as_mut() {
            backend.set_category_volume(category, volume);
        }
    }

    /// Push every channel volume from the settings.
    pub fn sync_settings(&mut self, settings: &AudioSettings) {
        for category in AudioCategory::ALL {
            self.set_category_volume(category, settings.volume(category));
        }
    }

    /// Play a cue. Returns false when audio is disabled.
    pub fn play_cue(&mut self, name: &str, options: CueOptions) -> bool {
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };
        let options = CueOptions {
            volume: if options.volume.is_finite() { options.volume.clamp(0.0, 1.0) } else { 0.0 },
            ..options
        };
        debug!("Play cue {} {:?}", name, options);
        backend.play_cue(name, &options);
        if options.looped {
            self.looping.insert(name.to_string());
        }
        true
    }

    /// Stop a looping cue. Unknown names are ignored.
    pub fn stop_cue(&mut self, name: &str) {
        if !self.looping.remove(name) {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.stop_cue(name);
        }
    }

    /// Swap the looping scene ambience.
    pub fn play_ambient(&mut self, ecosystem: EcosystemId) {
        let name = cues::ambient(ecosystem);
        if self.ambient.as_deref() == Some(name.as_str()) {
            return;
        }
        if let Some(previous) = self.ambient.take() {
            self.stop_cue(&previous);
        }
        let options = CueOptions {
            volume: 1.0,
            looped: true,
            category: AudioCategory::Music,
        };
        if self.play_cue(&name, options) {
            self.ambient = Some(name);
        }
    }

    pub fn stop_ambient(&mut self) {
        if let Some(previous) = self.ambient.take() {
            self.stop_cue(&previous);
        }
    }

    pub fn looping(&self) -> impl Iterator<Item = &str> {
        self.looping.iter().map(String::as_str)
    }

    /// Stop every loop and release the backend.
    pub fn shutdown(&mut self) {
        let names: Vec<String> = self.looping.iter().cloned().collect();
        for name in names {
            self.stop_cue(&name);
        }
        self.ambient = None;
        if self.backend.take().is_some() {
            info!("Audio shut down");
        }
    }
}

/// One call received by a [`RecordingAudio`] backend.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Play(String, CueOptions),
    Stop(String),
    Volume(AudioCategory, f32),
}

/// Backend that records calls instead of playing them. Clones share the
/// same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    calls: Rc<RefCell<Vec<AudioCall>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.borrow().clone()
    }

    pub fn played(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                AudioCall::Play(name, _) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl AudioBackend for RecordingAudio {
    fn play_cue(&mut self, name: &str, options: &CueOptions) {
        self.calls
            .borrow_mut()
            .push(AudioCall::Play(name.to_string(), *options));
    }

    fn stop_cue(&mut self, name: &str) {
        self.calls.borrow_mut().push(AudioCall::Stop(name.to_string()));
    }

    fn set_category_volume(&mut self, category: AudioCategory, volume: f32) {
        self.calls
            .borrow_mut()
            .push(AudioCall::Volume(category, volume));
    }
}
