//! Session mode machine: menu -> loading -> playing <-> paused.
//!
//! The orchestrator owns the mode and mirrors it into the store. It never
//! runs the simulator or the controller itself; the engine asks
//! [`SessionOrchestrator::mode`] each frame and gates them on it.

use ecowarriors_logic::ecosystem::EcosystemId;
use ecowarriors_logic::session::{next_mode, SessionEvent, SessionMode};
use log::{info, warn};

use crate::config::SessionConfig;
use crate::scene::SceneCollaborator;
use crate::store::PersistentStore;

#[derive(Debug, Clone)]
pub struct SessionOrchestrator {
    mode: SessionMode,
    min_loading_secs: f64,
    loading_elapsed: f64,
    scene_ready: bool,
}

impl Default for SessionOrchestrator {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl SessionOrchestrator {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            mode: SessionMode::Menu,
            min_loading_secs: config.min_loading_secs.max(0.0),
            loading_elapsed: 0.0,
            scene_ready: false,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Loading progress in `[0, 1]`, driven by the minimum loading time.
    pub fn loading_progress(&self) -> f32 {
        if self.mode != SessionMode::Loading {
            return if self.mode == SessionMode::Menu { 0.0 } else { 1.0 };
        }
        if self.min_loading_secs <= 0.0 {
            return if self.scene_ready { 1.0 } else { 0.0 };
        }
        (self.loading_elapsed / self.min_loading_secs).min(1.0) as f32
    }

    fn transition(&mut self, event: SessionEvent, store: &mut PersistentStore) -> bool {
        match next_mode(self.mode, event) {
            Some(next) => {
                info!("Session {:?} -> {:?} ({:?})", self.mode, next, event);
                self.mode = next;
                store.set_session_mode(next);
                true
            }
            None => {
                warn!("Ignoring {:?} while {:?}", event, self.mode);
                false
            }
        }
    }

    /// Menu -> loading, targeting `scene`.
    pub fn start(&mut self, scene: EcosystemId, store: &mut PersistentStore) -> bool {
        if !self.transition(SessionEvent::Start, store) {
            return false;
        }
        self.loading_elapsed = 0.0;
        self.scene_ready = false;
        store.set_current_ecosystem(scene);
        true
    }

    /// Advance loading. Becomes playing once the scene reports ready and
    /// the minimum loading time has passed. Returns true on that frame.
    pub fn update_loading(
        &mut self,
        dt: f64,
        scene: &mut dyn SceneCollaborator,
        store: &mut PersistentStore,
    ) -> bool {
        if self.mode != SessionMode::Loading {
            return false;
        }
        if dt.is_finite() && dt > 0.0 {
            self.loading_elapsed += dt;
        }
        if !self.scene_ready {
            self.scene_ready = scene.prepare(store.state().current_ecosystem);
        }
        if self.scene_ready && self.loading_elapsed + 1e-9 >= self.min_loading_secs {
            return self.transition(SessionEvent::Ready, store);
        }
        false
    }

    pub fn pause(&mut self, store: &mut PersistentStore) -> bool {
        self.transition(SessionEvent::Pause, store)
    }

    pub fn resume(&mut self, store: &mut PersistentStore) -> bool {
        self.transition(SessionEvent::Resume, store)
    }

    /// Playing/paused -> menu. Progress is only wiped when asked.
    pub fn to_menu(&mut self, reset_progress: bool, store: &mut PersistentStore) -> bool {
        if !self.transition(SessionEvent::ToMenu, store) {
            return false;
        }
        if reset_progress {
            store.reset();
        }
        true
    }

    /// Swap the active ecosystem. Only allowed while playing.
    pub fn switch_scene(&mut self, scene: EcosystemId, store: &mut PersistentStore) -> bool {
        if self.mode != SessionMode::Playing {
            warn!("Ignoring scene switch to {} while {:?}", scene, self.mode);
            return false;
        }
        if !store.set_current_ecosystem(scene) {
            return false;
        }
        info!("Switched scene to {}", scene);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NullScene;
    use ecowarriors_logic::visuals::VisualParams;

    /// Scene that needs a number of prepare calls before it is ready.
    struct SlowScene {
        remaining: u32,
    }

    impl SceneCollaborator for SlowScene {
        fn prepare(&mut self, _: EcosystemId) -> bool {
            self.remaining = self.remaining.saturating_sub(1);
            self.remaining == 0
        }

        fn render(&mut self, _: EcosystemId, _: &VisualParams) {}
    }

    #[test]
    fn test_minimum_loading_time() {
        let mut session = SessionOrchestrator::default();
        let mut store = PersistentStore::new();
        assert!(session.start(EcosystemId::Ocean, &mut store));
        assert_eq!(store.state().mode, SessionMode::Loading);
        assert_eq!(store.state().current_ecosystem, EcosystemId::Ocean);

        let mut scene = NullScene;
        for _ in 0..19 {
            assert!(!session.update_loading(0.1, &mut scene, &mut store));
        }
        assert!(session.loading_progress() < 1.0);
        assert!(session.update_loading(0.1, &mut scene, &mut store), "ready at 2.0 s");
        assert_eq!(session.mode(), SessionMode::Playing);
    }

    #[test]
    fn test_slow_scene_extends_loading() {
        let config = SessionConfig {
            min_loading_secs: 0.5,
            ..SessionConfig::default()
        };
        let mut session = SessionOrchestrator::new(&config);
        let mut store = PersistentStore::new();
        session.start(EcosystemId::Forest, &mut store);
        let mut scene = SlowScene { remaining: 10 };
        let mut frames = 0;
        while !session.update_loading(0.1, &mut scene, &mut store) {
            frames += 1;
            assert!(frames < 100, "never became ready");
        }
        assert_eq!(frames, 9, "ready on the tenth prepare, well past 0.5 s");
    }

    #[test]
    fn test_pause_resume_and_menu() {
        let mut session = SessionOrchestrator::new(&SessionConfig {
            min_loading_secs: 0.0,
            ..SessionConfig::default()
        });
        let mut store = PersistentStore::new();
        assert!(!session.pause(&mut store), "cannot pause from menu");
        session.start(EcosystemId::Forest, &mut store);
        assert!(session.update_loading(0.0, &mut NullScene, &mut store));
        assert!(session.pause(&mut store));
        assert!(!session.pause(&mut store));
        assert!(session.resume(&mut store));
        assert!(session.to_menu(false, &mut store));
        assert_eq!(store.state().mode, SessionMode::Menu);
    }

    #[test]
    fn test_to_menu_reset_is_opt_in() {
        let mut session = SessionOrchestrator::new(&SessionConfig {
            min_loading_secs: 0.0,
            ..SessionConfig::default()
        });
        let mut store = PersistentStore::new();
        store.add_experience(120);
        session.start(EcosystemId::Forest, &mut store);
        session.update_loading(0.0, &mut NullScene, &mut store);
        session.to_menu(false, &mut store);
        assert_eq!(store.state().progress.experience(), 120);

        session.start(EcosystemId::Forest, &mut store);
        session.update_loading(0.0, &mut NullScene, &mut store);
        session.to_menu(true, &mut store);
        assert_eq!(store.state().progress.experience(), 0);
    }

    #[test]
    fn test_scene_switch_only_while_playing() {
        let mut session = SessionOrchestrator::new(&SessionConfig {
            min_loading_secs: 0.0,
            ..SessionConfig::default()
        });
        let mut store = PersistentStore::new();
        assert!(!session.switch_scene(EcosystemId::Urban, &mut store));
        session.start(EcosystemId::Forest, &mut store);
        session.update_loading(0.0, &mut NullScene, &mut store);
        assert!(session.switch_scene(EcosystemId::Urban, &mut store));
        assert_eq!(store.state().current_ecosystem, EcosystemId::Urban);
        session.pause(&mut store);
        assert!(!session.switch_scene(EcosystemId::Ocean, &mut store));
        assert_eq!(store.state().current_ecosystem, EcosystemId::Urban);
    }
}
