//! Game engine - the single-threaded frame loop that wires everything up

use std::io::{Read, Write};

use ecowarriors_logic::ecosystem::EcosystemId;
use ecowarriors_logic::quests::find_quest;
use ecowarriors_logic::session::SessionMode;
use ecowarriors_logic::visuals::{derive_visuals, scene_profile, EcoAlert, VisualParams};
use log::{info, warn};

use crate::audio::{cues, AudioBackend, AudioService, CueOptions};
use crate::config::GameConfig;
use crate::controller::PlayerController;
use crate::error::StorageError;
use crate::input::{InputState, KeyCode};
use crate::particles::ParticleField;
use crate::performance::{PerformanceMonitor, QualityDirective};
use crate::persistence::{self, FileStorage};
use crate::physics::{KinematicWorld, PhysicsBackend};
use crate::scene::{NullScene, SceneCollaborator};
use crate::session::SessionOrchestrator;
use crate::simulator::EcosystemSimulator;
use crate::store::PersistentStore;
use crate::ui::{hotkey_intent, Intent, NotificationKind, UiState};

/// Experience per pollution point removed by a cleanup.
pub const CLEANUP_XP_PER_POINT: f64 = 1.0;

/// Summary of one [`GameEngine::update`] call.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub mode: SessionMode,
    /// Simulator ticks fired this frame.
    pub ticks: u32,
    /// Alerts that became active this frame.
    pub new_alerts: Vec<EcoAlert>,
    pub quality: Option<QualityDirective>,
    /// True on the frame loading finished.
    pub entered_playing: bool,
}

/// Main game engine
pub struct GameEngine {
    config: GameConfig,
    store: PersistentStore,
    simulator: EcosystemSimulator,
    controller: PlayerController,
    physics: Option<Box<dyn PhysicsBackend>>,
    input: InputState,
    session: SessionOrchestrator,
    scene: Box<dyn SceneCollaborator>,
    particles: ParticleField,
    audio: AudioService,
    performance: PerformanceMonitor,
    ui: UiState,
    visuals: Option<VisualParams>,
}

impl GameEngine {
    /// Build an engine from config: file-backed store if a save directory is
    /// configured (in-memory otherwise), kinematic physics, headless scene
    /// and no audio device.
    pub fn new(config: GameConfig) -> Self {
        let store = match &config.storage.save_dir {
            Some(dir) => PersistentStore::open(
                Box::new(FileStorage::new(dir.clone())),
                &config.storage.record_name,
            ),
            None => PersistentStore::new(),
        };
        Self::with_store(config, store)
    }

    /// Build an engine around an existing store.
    pub fn with_store(config: GameConfig, store: PersistentStore) -> Self {
        let audio = AudioService::create(None, &store.state().settings.audio);
        Self {
            simulator: EcosystemSimulator::new(&config.simulation),
            controller: PlayerController::new(config.player.clone()),
            physics: Some(Box::new(KinematicWorld::new(&config.physics))),
            input: InputState::new(),
            session: SessionOrchestrator::new(&config.session),
            scene: Box::new(NullScene),
            particles: ParticleField::new(config.simulation.particle_seed),
            audio,
            performance: PerformanceMonitor::create(&config.performance),
            ui: UiState::new(),
            visuals: None,
            store,
            config,
        }
    }

    /// Replace the physics backend. `None` disables player movement.
    pub fn with_physics(mut self, physics: Option<Box<dyn PhysicsBackend>>) -> Self {
        self.physics = physics;
        self
    }

    pub fn with_scene(mut self, scene: Box<dyn SceneCollaborator>) -> Self {
        self.scene = scene;
        self
    }

    pub fn with_audio(mut self, backend: Box<dyn AudioBackend>) -> Self {
        self.audio.shutdown();
        self.audio = AudioService::create(Some(backend), &self.store.state().settings.audio);
        self
    }

    // ---------------------------------------------------------------------
    // Frame loop
    // ---------------------------------------------------------------------

    /// Advance one render frame of `dt` seconds.
    ///
    /// Persisted changes made during the frame, or by intents dispatched
    /// since the last one, reach storage in a single write at the end.
    pub fn update(&mut self, dt: f32) -> FrameReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let mut report = FrameReport {
            quality: self.performance.record_frame(dt),
            ..FrameReport::default()
        };

        match self.session.mode() {
            SessionMode::Loading => {
                if self
                    .session
                    .update_loading(dt as f64, self.scene.as_mut(), &mut self.store)
                {
                    self.enter_scene();
                    report.entered_playing = true;
                }
            }
            SessionMode::Playing => {
                let controls = self.store.state().settings.controls.clone();
                let physics: Option<&mut dyn PhysicsBackend> = match self.physics.as_mut() {
                    Some(p) => Some(p.as_mut()),
                    None => None,
                };
                self.controller
                    .update(dt, &mut self.input, physics, &controls, &mut self.store);

                let current = self.store.state().current_ecosystem;
                report.ticks = self.simulator.advance(dt as f64, current, &mut self.store);
                if report.ticks > 0 {
                    let played = report.ticks as f64 * self.simulator.interval();
                    self.store.update_stat("playTime", played);
                }
                self.particles.update(dt);
            }
            SessionMode::Menu | SessionMode::Paused => {}
        }

        report.mode = self.session.mode();
        if report.mode.shows_world() {
            report.new_alerts = self.refresh_visuals();
        } else {
            self.visuals = None;
        }
        self.store.flush();
        report
    }

    /// Recompute the derived visuals from the freshest numbers and render.
    fn refresh_visuals(&mut self) -> Vec<EcoAlert> {
        let state = self.store.state();
        let current = state.current_ecosystem;
        let particles_enabled = self
            .performance
            .quality()
            .effective(&state.settings.graphics)
            .particles;
        let visuals = derive_visuals(current, &state.current(), particles_enabled);

        self.particles.sync_count(visuals.particle_count);
        let rising = self.ui.observe_alerts(current, &visuals.alerts);
        if rising.contains(&EcoAlert::Critical) {
            self.audio.play_cue(cues::CRITICAL_ALERT, CueOptions::default());
        }
        if rising.contains(&EcoAlert::Thriving) {
            self.audio.play_cue(cues::THRIVING_NOTICE, CueOptions::default());
        }

        self.scene.render(current, &visuals);
        self.visuals = Some(visuals);
        rising
    }

    /// Place the player at the current scene's entry point and start its
    /// ambience.
    fn enter_scene(&mut self) {
        let current = self.store.state().current_ecosystem;
        let entry = scene_profile(current).entry_point;
        let physics: Option<&mut dyn PhysicsBackend> = match self.physics.as_mut() {
            Some(p) => Some(p.as_mut()),
            None => None,
        };
        self.controller.reset_to(entry, physics, &mut self.store);
        self.particles.clear();
        self.ui.forget_alerts();
        self.audio.play_ambient(current);
        info!("Entered {} at {:?}", current, entry);
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    /// Key press from the host. UI hotkeys dispatch intents; movement keys
    /// only register while playing.
    pub fn key_down(&mut self, key: KeyCode) {
        let mode = self.session.mode();
        if let Some(intent) = hotkey_intent(key, mode) {
            self.dispatch(intent);
            return;
        }
        if mode == SessionMode::Playing {
            self.input.key_down(key);
        }
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.input.key_up(key);
    }

    pub fn pointer_delta(&mut self, dx: f32, dy: f32) {
        if self.session.mode() == SessionMode::Playing {
            self.input.pointer_delta(dx, dy);
        }
    }

    pub fn set_pointer_captured(&mut self, captured: bool) {
        self.input.set_pointer_captured(captured);
    }

    // ---------------------------------------------------------------------
    // Intents
    // ---------------------------------------------------------------------

    /// Apply a UI intent. Returns whether it had any effect.
    pub fn dispatch(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::ToggleInventory
            | Intent::ToggleQuestLog
            | Intent::ToggleMap
            | Intent::ToggleSettings => self.ui.toggle(&intent),
            Intent::StartQuest(id) => self.start_quest(&id),
            Intent::CompleteQuest(id) => self.complete_quest(&id),
            Intent::UpdateSetting {
                category,
                key,
                value,
            } => {
                let changed = self.store.update_setting(&category, &key, value);
                if changed && category == "audio" {
                    self.audio.sync_settings(&self.store.state().settings.audio);
                }
                changed
            }
            Intent::SwitchScene(id) => self.switch_scene(id),
            Intent::CleanPollution { amount } => self.clean_pollution(amount),
            Intent::StartGame => {
                let start = self.config.session.start_scene;
                if !self.session.start(start, &mut self.store) {
                    return false;
                }
                self.simulator.reset_timer();
                self.input.release_all();
                true
            }
            Intent::Pause => {
                if !self.session.pause(&mut self.store) {
                    return false;
                }
                self.input.release_all();
                true
            }
            Intent::Resume => self.session.resume(&mut self.store),
            Intent::ToMenu { reset_progress } => {
                if !self.session.to_menu(reset_progress, &mut self.store) {
                    return false;
                }
                self.ui.reset();
                self.audio.stop_ambient();
                self.particles.clear();
                self.input.release_all();
                self.input.set_pointer_captured(false);
                self.visuals = None;
                true
            }
        }
    }

    fn start_quest(&mut self, id: &str) -> bool {
        if !self.store.start_quest(id) {
            return false;
        }
        let title = find_quest(id).map(|q| q.title).unwrap_or(id);
        self.ui.notify(NotificationKind::Quest, format!("Quest started: {title}"));
        true
    }

    /// Complete a quest and pay out its catalog rewards.
    fn complete_quest(&mut self, id: &str) -> bool {
        if !self.store.complete_quest(id) {
            return false;
        }
        match find_quest(id) {
            Some(quest) => {
                self.ui.notify(
                    NotificationKind::Quest,
                    format!("Quest complete: {}", quest.title),
                );
                if let Some(recipe) = quest.reward_recipe {
                    self.store.unlock_recipe(recipe);
                }
                self.award_experience(quest.reward_experience);
            }
            None => warn!("Completed quest '{}' has no catalog entry, no reward", id),
        }
        self.audio.play_cue(cues::QUEST_COMPLETE, CueOptions::default());
        true
    }

    fn award_experience(&mut self, amount: u64) {
        if let Some(gain) = self.store.add_experience(amount) {
            if gain.levels_gained() > 0 {
                self.ui.notify(
                    NotificationKind::LevelUp,
                    format!("Level up! You are now level {}", gain.new_level),
                );
                self.audio.play_cue(cues::LEVEL_UP, CueOptions::default());
            }
        }
    }

    fn switch_scene(&mut self, id: EcosystemId) -> bool {
        if !self.session.switch_scene(id, &mut self.store) {
            return false;
        }
        self.enter_scene();
        true
    }

    /// Remove pollution from the current ecosystem and credit the player.
    fn clean_pollution(&mut self, amount: f64) -> bool {
        if self.session.mode() != SessionMode::Playing || !(amount.is_finite() && amount > 0.0) {
            return false;
        }
        let current = self.store.state().current_ecosystem;
        let before = self.store.state().current();
        if !self
            .store
            .set_ecosystem(current, before.health(), before.pollution() - amount)
        {
            return false;
        }
        let cleaned = before.pollution() - self.store.state().current().pollution();
        self.store.update_stat("totalCleaned", cleaned);
        self.award_experience((cleaned * CLEANUP_XP_PER_POINT).round() as u64);
        true
    }

    // ---------------------------------------------------------------------
    // Snapshots & lifecycle
    // ---------------------------------------------------------------------

    pub fn export_snapshot<W: Write>(&self, writer: W) -> Result<(), StorageError> {
        persistence::export_snapshot(writer, self.store.state())
    }

    /// Replace progress, settings and ecosystems from a snapshot.
    pub fn import_snapshot<R: Read>(&mut self, reader: R) -> Result<(), StorageError> {
        let record = persistence::import_snapshot(reader)?;
        self.store.restore(record);
        self.audio.sync_settings(&self.store.state().settings.audio);
        Ok(())
    }

    /// Stop services and write any pending save.
    pub fn shutdown(&mut self) {
        self.audio.shutdown();
        self.performance.shutdown();
        if !self.store.flush() {
            warn!("Save record still unwritten at shutdown");
        }
        info!("Engine shut down");
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn mode(&self) -> SessionMode {
        self.session.mode()
    }

    pub fn session(&self) -> &SessionOrchestrator {
        &self.session
    }

    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PersistentStore {
        &mut self.store
    }

    pub fn simulator(&self) -> &EcosystemSimulator {
        &self.simulator
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn audio(&self) -> &AudioService {
        &self.audio
    }

    pub fn performance(&self) -> &PerformanceMonitor {
        &self.performance
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Visual parameters of the last frame the world was on screen.
    pub fn visuals(&self) -> Option<&VisualParams> {
        self.visuals.as_ref()
    }
}
