//! The authoritative game state and its mutators.
//!
//! [`PersistentStore`] owns one [`GameState`]. Every mutator applies a rule
//! from `ecowarriors-logic`, reports whether anything changed, notifies
//! subscribers and, for the persisted subset, marks the durable record dirty.
//! No-ops notify nobody and dirty nothing.
//!
//! Dirty records are written by [`PersistentStore::flush`], which the engine
//! calls once per frame, and on drop. A failed write keeps the record dirty
//! so the next flush retries it.

use std::collections::BTreeMap;

use ecowarriors_logic::ecosystem::{initial_ecosystems, EcosystemId, EcosystemState};
use ecowarriors_logic::progression::{ExperienceGain, PlayerProgress};
use ecowarriors_logic::session::SessionMode;
use ecowarriors_logic::settings::Settings;
use ecowarriors_logic::visuals::scene_profile;
use glam::Vec3;
use log::{debug, info, warn};

use crate::error::SettingError;
use crate::persistence::{
    decode_record, encode_record, from_persisted, PersistedState, StorageBackend,
};

/// Player position and Euler rotation (x = pitch, y = yaw, z = roll).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPose {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Default for PlayerPose {
    fn default() -> Self {
        Self {
            position: scene_profile(EcosystemId::Forest).entry_point,
            rotation: Vec3::ZERO,
        }
    }
}

/// Everything the UI and scene layers can observe.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub ecosystems: BTreeMap<EcosystemId, EcosystemState>,
    pub progress: PlayerProgress,
    pub settings: Settings,
    /// Transient mirror of the controller's pose.
    pub pose: PlayerPose,
    /// Transient mirror of the session mode.
    pub mode: SessionMode,
    /// Ecosystem whose scene is active. Not persisted.
    pub current_ecosystem: EcosystemId,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            ecosystems: initial_ecosystems(),
            progress: PlayerProgress::default(),
            settings: Settings::default(),
            pose: PlayerPose::default(),
            mode: SessionMode::Menu,
            current_ecosystem: EcosystemId::Forest,
        }
    }
}

impl GameState {
    /// State of one ecosystem. Every id is always present after construction.
    pub fn ecosystem(&self, id: EcosystemId) -> EcosystemState {
        self.ecosystems
            .get(&id)
            .copied()
            .unwrap_or_else(|| id.initial_state())
    }

    pub fn current(&self) -> EcosystemState {
        self.ecosystem(self.current_ecosystem)
    }
}

/// Which slice of the state a committed mutation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Ecosystem(EcosystemId),
    Experience,
    Quests,
    Recipes,
    Inventory,
    Stats,
    Settings,
    Pose,
    Session,
    Scene,
    Reset,
}

impl Change {
    /// Whether this change touches the persisted subset.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, Change::Pose | Change::Session | Change::Scene)
    }
}

/// Handle returned by [`PersistentStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&GameState, &Change)>;

/// Owner of [`GameState`]; see the module docs.
pub struct PersistentStore {
    state: GameState,
    storage: Option<Box<dyn StorageBackend>>,
    record_name: String,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    dirty: bool,
    write_failed: bool,
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("state", &self.state)
            .field("record_name", &self.record_name)
            .field("has_storage", &self.storage.is_some())
            .field("subscribers", &self.subscribers.len())
            .field("dirty", &self.dirty)
            .field("write_failed", &self.write_failed)
            .finish()
    }
}

impl Default for PersistentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentStore {
    /// A store with default state and no durable storage.
    pub fn new() -> Self {
        Self {
            state: GameState::default(),
            storage: None,
            record_name: String::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            dirty: false,
            write_failed: false,
        }
    }

    /// Open a store over durable storage. The record is read once; an
    /// unreadable or corrupt record falls back to defaults.
    ///
    /// A corrupt record is copied to `<record_name>.corrupt` before the first
    /// write can replace it.
    pub fn open(mut storage: Box<dyn StorageBackend>, record_name: &str) -> Self {
        let state = match storage.read(record_name) {
            Ok(Some(text)) => match decode_record(&text) {
                Ok(record) => {
                    info!("Loaded save record '{}'", record_name);
                    from_persisted(record, GameState::default())
                }
                Err(e) => {
                    warn!("Ignoring corrupt save record '{}': {}", record_name, e);
                    let backup = corrupt_record_name(record_name);
                    match storage.write(&backup, &text) {
                        Ok(()) => info!("Kept corrupt save record as '{}'", backup),
                        Err(e) => warn!("Could not keep corrupt save record: {}", e),
                    }
                    GameState::default()
                }
            },
            Ok(None) => {
                info!("No save record '{}', starting fresh", record_name);
                GameState::default()
            }
            Err(e) => {
                warn!("Could not read save record '{}': {}", record_name, e);
                GameState::default()
            }
        };
        let mut store = Self::new();
        store.state = state;
        store.storage = Some(storage);
        store.record_name = record_name.to_string();
        store
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// True while a persisted change has not reached storage yet.
    pub fn has_pending_write(&self) -> bool {
        self.dirty
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&GameState, &Change) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false for an unknown id.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    // ---------------------------------------------------------------------
    // Mutators
    // ---------------------------------------------------------------------

    /// Set an ecosystem's numbers. Both are clamped into `[0, 100]`.
    pub fn set_ecosystem(&mut self, id: EcosystemId, health: f64, pollution: f64) -> bool {
        let next = EcosystemState::new(health, pollution);
        if self.state.ecosystems.get(&id) == Some(&next) {
            return false;
        }
        self.state.ecosystems.insert(id, next);
        self.commit(Change::Ecosystem(id));
        true
    }

    /// Award experience. Returns the level change, or `None` for a zero award.
    pub fn add_experience(&mut self, amount: u64) -> Option<ExperienceGain> {
        let gain = self.state.progress.add_experience(amount)?;
        if gain.levels_gained() > 0 {
            info!("Level up: {} -> {}", gain.old_level, gain.new_level);
        }
        self.commit(Change::Experience);
        Some(gain)
    }

    pub fn start_quest(&mut self, quest_id: &str) -> bool {
        if !self.state.progress.start_quest(quest_id) {
            return false;
        }
        self.commit(Change::Quests);
        true
    }

    pub fn complete_quest(&mut self, quest_id: &str) -> bool {
        if !self.state.progress.complete_quest(quest_id) {
            return false;
        }
        self.commit(Change::Quests);
        true
    }

    pub fn unlock_recipe(&mut self, recipe_id: &str) -> bool {
        if !self.state.progress.unlock_recipe(recipe_id) {
            return false;
        }
        self.commit(Change::Recipes);
        true
    }

    pub fn add_to_inventory(&mut self, category: &str, item: &str, quantity: u32) -> bool {
        if !self.state.progress.inventory.add(category, item, quantity) {
            return false;
        }
        self.commit(Change::Inventory);
        true
    }

    pub fn remove_from_inventory(&mut self, category: &str, item: &str, quantity: u32) -> bool {
        if !self.state.progress.inventory.remove(category, item, quantity) {
            return false;
        }
        self.commit(Change::Inventory);
        true
    }

    /// Add to a stat counter. Non-positive or non-finite deltas are ignored.
    pub fn update_stat(&mut self, name: &str, delta: f64) -> bool {
        if !self.state.progress.stats.add(name, delta) {
            return false;
        }
        self.commit(Change::Stats);
        true
    }

    /// Change one setting, logging and ignoring invalid input.
    pub fn update_setting(&mut self, category: &str, key: &str, value: serde_json::Value) -> bool {
        match self.try_update_setting(category, key, value) {
            Ok(changed) => changed,
            Err(e) => {
                warn!("Ignoring setting update: {}", e);
                false
            }
        }
    }

    /// Change one setting addressed by its serialized category and key.
    ///
    /// The value must fit the typed schema; numeric values are then clamped
    /// into the ranges the menus allow.
    pub fn try_update_setting(
        &mut self,
        category: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<bool, SettingError> {
        let next = apply_setting(&self.state.settings, category, key, value)?;
        if next == self.state.settings {
            return Ok(false);
        }
        self.state.settings = next;
        self.commit(Change::Settings);
        Ok(true)
    }

    /// Mirror the controller's pose. Not persisted.
    pub fn set_player_pose(&mut self, pose: PlayerPose) -> bool {
        if self.state.pose == pose {
            return false;
        }
        self.state.pose = pose;
        self.commit(Change::Pose);
        true
    }

    /// Mirror the session mode. Not persisted.
    pub fn set_session_mode(&mut self, mode: SessionMode) -> bool {
        if self.state.mode == mode {
            return false;
        }
        self.state.mode = mode;
        self.commit(Change::Session);
        true
    }

    /// Switch the active ecosystem. Not persisted.
    pub fn set_current_ecosystem(&mut self, id: EcosystemId) -> bool {
        if self.state.current_ecosystem == id {
            return false;
        }
        self.state.current_ecosystem = id;
        self.commit(Change::Scene);
        true
    }

    /// Restore the persisted subset to its defaults except settings. The
    /// transient fields are kept.
    pub fn reset(&mut self) {
        self.state = GameState {
            settings: std::mem::take(&mut self.state.settings),
            pose: self.state.pose,
            mode: self.state.mode,
            current_ecosystem: self.state.current_ecosystem,
            ..GameState::default()
        };
        info!("Store reset to defaults");
        self.commit(Change::Reset);
    }

    /// Replace the persisted subset (e.g. from an imported snapshot). The
    /// transient fields are kept.
    pub fn restore(&mut self, record: PersistedState) {
        let defaults = GameState {
            pose: self.state.pose,
            mode: self.state.mode,
            current_ecosystem: self.state.current_ecosystem,
            ..GameState::default()
        };
        self.state = from_persisted(record, defaults);
        info!("Store restored from record");
        self.commit(Change::Reset);
    }

    /// Write the durable record if a persisted change is pending. Returns
    /// false when the write failed; the change stays pending.
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return true;
        }
        let Some(storage) = self.storage.as_mut() else {
            self.dirty = false;
            return true;
        };
        let result = encode_record(&self.state).and_then(|json| storage.write(&self.record_name, &json));
        match result {
            Ok(()) => {
                if self.write_failed {
                    info!("Save record '{}' written after earlier failure", self.record_name);
                }
                self.dirty = false;
                self.write_failed = false;
                true
            }
            Err(e) => {
                if self.write_failed {
                    debug!("Save record '{}' still unwritable: {}", self.record_name, e);
                } else {
                    warn!("Failed to write save record '{}': {}", self.record_name, e);
                }
                self.write_failed = true;
                false
            }
        }
    }

    fn commit(&mut self, change: Change) {
        debug!("Store change: {:?}", change);
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&self.state, &change);
        }
        if change.is_persisted() {
            self.dirty = true;
        }
    }
}

impl Drop for PersistentStore {
    fn drop(&mut self) {
        if self.dirty && !self.flush() {
            warn!("Dropping store with unsaved changes to '{}'", self.record_name);
        }
    }
}

/// Storage name a corrupt record is copied to.
pub fn corrupt_record_name(record_name: &str) -> String {
    format!("{record_name}.corrupt")
}

/// Apply a `(category, key, value)` update to a copy of `settings`.
fn apply_setting(
    settings: &Settings,
    category: &str,
    key: &str,
    value: serde_json::Value,
) -> Result<Settings, SettingError> {
    let mismatch = |reason: String| SettingError::TypeMismatch {
        category: category.to_string(),
        key: key.to_string(),
        reason,
    };

    let mut tree = serde_json::to_value(settings).map_err(|e| mismatch(e.to_string()))?;
    let section = tree
        .get_mut(category)
        .and_then(serde_json::Value::as_object_mut)
        .ok_or_else(|| SettingError::UnknownCategory(category.to_string()))?;
    let slot = section.get_mut(key).ok_or_else(|| SettingError::UnknownKey {
        category: category.to_string(),
        key: key.to_string(),
    })?;
    *slot = value;

    let parsed: Settings = serde_json::from_value(tree).map_err(|e| mismatch(e.to_string()))?;
    Ok(parsed.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{to_persisted, MemoryStorage, DEFAULT_RECORD_NAME};
    use ecowarriors_logic::settings::QualityTier;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorded(store: &mut PersistentStore) -> Rc<RefCell<Vec<Change>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        store.subscribe(move |_, change| sink.borrow_mut().push(change.clone()));
        log
    }

    #[test]
    fn test_set_ecosystem_clamps() {
        let mut store = PersistentStore::new();
        assert!(store.set_ecosystem(EcosystemId::Ocean, 140.0, -3.0));
        let ocean = store.state().ecosystem(EcosystemId::Ocean);
        assert_eq!(ocean.health(), 100.0);
        assert_eq!(ocean.pollution(), 0.0);
        assert!(!store.set_ecosystem(EcosystemId::Ocean, 100.0, 0.0), "same values are a no-op");
    }

    #[test]
    fn test_add_experience_levels_and_points() {
        let mut store = PersistentStore::new();
        let gain = store.add_experience(250).unwrap();
        let progress = &store.state().progress;
        assert_eq!(progress.experience(), 250);
        assert_eq!(progress.level(), 3);
        assert_eq!(progress.skill_points(), 2);
        assert_eq!(gain.levels_gained(), 2);
    }

    #[test]
    fn test_complete_quest_idempotent() {
        let mut store = PersistentStore::new();
        store.start_quest("cleanup-forest-1");
        assert!(store.complete_quest("cleanup-forest-1"));
        assert!(!store.complete_quest("cleanup-forest-1"));
        let progress = &store.state().progress;
        assert!(progress.active_quests.is_empty());
        assert_eq!(progress.completed_quests.len(), 1);
    }

    #[test]
    fn test_remove_more_than_held_deletes_entry() {
        let mut store = PersistentStore::new();
        store.add_to_inventory("materials", "wood", 3);
        assert!(store.remove_from_inventory("materials", "wood", 5));
        let materials = store.state().progress.inventory.category("materials").unwrap();
        assert!(!materials.contains_key("wood"), "no zero entries persist");
    }

    #[test]
    fn test_subscribers_see_changes_but_not_noops() {
        let mut store = PersistentStore::new();
        let log = recorded(&mut store);
        store.start_quest("q");
        store.start_quest("q");
        store.update_stat("treesPlanted", -2.0);
        store.update_stat("treesPlanted", 1.0);
        assert_eq!(*log.borrow(), vec![Change::Quests, Change::Stats]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = PersistentStore::new();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = store.subscribe(move |_, _| *sink.borrow_mut() += 1);
        store.add_experience(10);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_experience(10);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_subscriber_sees_committed_state() {
        let mut store = PersistentStore::new();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        store.subscribe(move |state, _| *sink.borrow_mut() = Some(state.progress.level()));
        store.add_experience(100);
        assert_eq!(*seen.borrow(), Some(2));
    }

    #[test]
    fn test_update_setting_typed() {
        let mut store = PersistentStore::new();
        assert!(store.update_setting("graphics", "quality", json!("low")));
        assert_eq!(store.state().settings.graphics.quality, QualityTier::Low);
        assert!(store.update_setting("audio", "musicVolume", json!(1.7)));
        assert_eq!(store.state().settings.audio.music_volume, 1.0, "clamped");
        assert!(store.update_setting("controls", "invertY", json!(true)));
        assert!(store.state().settings.controls.invert_y);
    }

    #[test]
    fn test_update_setting_rejects_bad_input() {
        let mut store = PersistentStore::new();
        let before = store.state().settings.clone();
        assert_eq!(
            store.try_update_setting("network", "port", json!(1)),
            Err(SettingError::UnknownCategory("network".into()))
        );
        assert!(matches!(
            store.try_update_setting("audio", "bassBoost", json!(1)),
            Err(SettingError::UnknownKey { .. })
        ));
        assert!(matches!(
            store.try_update_setting("graphics", "shadows", json!("yes")),
            Err(SettingError::TypeMismatch { .. })
        ));
        assert!(!store.update_setting("graphics", "quality", json!("cinematic")));
        assert_eq!(store.state().settings, before);
    }

    #[test]
    fn test_reset_keeps_settings() {
        let mut store = PersistentStore::new();
        store.update_setting("audio", "masterVolume", json!(0.3));
        store.add_experience(500);
        store.set_ecosystem(EcosystemId::Forest, 10.0, 90.0);
        store.set_current_ecosystem(EcosystemId::Urban);
        store.set_session_mode(SessionMode::Paused);
        let pose = PlayerPose {
            position: Vec3::new(4.0, 1.0, 2.0),
            rotation: Vec3::ZERO,
        };
        store.set_player_pose(pose);
        store.reset();
        let state = store.state();
        assert_eq!(state.progress, PlayerProgress::default());
        assert_eq!(state.ecosystem(EcosystemId::Forest), EcosystemId::Forest.initial_state());
        assert_eq!(state.settings.audio.master_volume, 0.3);
        assert_eq!(state.current_ecosystem, EcosystemId::Urban, "transient fields kept");
        assert_eq!(state.mode, SessionMode::Paused);
        assert_eq!(state.pose, pose);
    }

    #[test]
    fn test_persisted_changes_are_written() {
        let storage = MemoryStorage::new();
        let mut store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
        assert!(storage.get(DEFAULT_RECORD_NAME).is_none(), "opening writes nothing");

        store.set_player_pose(PlayerPose {
            position: Vec3::ONE,
            rotation: Vec3::ZERO,
        });
        assert!(!store.has_pending_write());
        assert!(store.flush());
        assert!(storage.get(DEFAULT_RECORD_NAME).is_none(), "pose is transient");

        store.add_to_inventory("tools", "shovel", 1);
        assert!(store.has_pending_write());
        assert!(storage.get(DEFAULT_RECORD_NAME).is_none(), "written on flush");
        assert!(store.flush());
        let written = storage.get(DEFAULT_RECORD_NAME).expect("record written");
        assert!(written.contains("shovel"));
        assert!(!store.has_pending_write());
    }

    #[test]
    fn test_many_changes_flush_as_one_write() {
        let storage = MemoryStorage::new();
        let mut store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
        for id in EcosystemId::ALL {
            store.set_ecosystem(id, 10.0, 20.0);
        }
        store.update_stat("playTime", 4.0);
        assert_eq!(storage.writes(), 0);
        assert!(store.flush());
        assert!(store.flush(), "clean flush is a no-op");
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn test_drop_writes_pending_changes() {
        let storage = MemoryStorage::new();
        {
            let mut store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
            store.add_experience(20);
        }
        let record = decode_record(&storage.get(DEFAULT_RECORD_NAME).unwrap()).unwrap();
        assert_eq!(record.experience, 20);
    }

    #[test]
    fn test_restart_round_trip() {
        let storage = MemoryStorage::new();
        let expected = {
            let mut store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
            store.add_experience(340);
            store.start_quest("cleanup-forest-1");
            store.unlock_recipe("advanced-cleaner");
            store.set_ecosystem(EcosystemId::Mountain, 66.6, 33.3);
            store.update_setting("controls", "mouseSensitivity", json!(1.5));
            store.set_session_mode(SessionMode::Playing);
            store.set_player_pose(PlayerPose {
                position: Vec3::new(9.0, 2.0, 9.0),
                rotation: Vec3::new(0.2, 0.4, 0.0),
            });
            to_persisted(store.state())
        };

        let reopened = PersistentStore::open(Box::new(storage), DEFAULT_RECORD_NAME);
        assert_eq!(to_persisted(reopened.state()), expected);
        assert_eq!(reopened.state().pose, PlayerPose::default());
        assert_eq!(reopened.state().mode, SessionMode::Menu);
    }

    #[test]
    fn test_write_failure_retried_on_next_mutation() {
        let storage = MemoryStorage::new();
        let mut store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
        storage.set_read_only(true);
        assert!(store.add_experience(50).is_some(), "mutation still applies");
        assert!(!store.flush());
        assert!(!store.flush(), "still failing");
        assert!(store.has_pending_write());
        assert!(storage.get(DEFAULT_RECORD_NAME).is_none());

        storage.set_read_only(false);
        store.update_stat("speciesSaved", 1.0);
        assert!(store.flush());
        assert!(!store.has_pending_write());
        let written = storage.get(DEFAULT_RECORD_NAME).unwrap();
        assert!(written.contains("\"experience\":50"), "whole record rewritten: {written}");
    }

    #[test]
    fn test_corrupt_record_falls_back_to_defaults() {
        let storage = MemoryStorage::new();
        storage.insert(DEFAULT_RECORD_NAME, "not json at all");
        let mut store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
        assert_eq!(*store.state(), GameState::default());

        store.add_experience(10);
        assert!(store.flush());
        assert_eq!(
            storage.get(&corrupt_record_name(DEFAULT_RECORD_NAME)).as_deref(),
            Some("not json at all"),
            "unreadable record kept aside"
        );
    }

    #[test]
    fn test_wrong_typed_field_does_not_lose_progress() {
        let storage = MemoryStorage::new();
        storage.insert(
            DEFAULT_RECORD_NAME,
            r#"{"experience":740,"inventory":{"materials":{"wood":3},"tools":[],"items":[]},"ecosystemHealth":{"forest":12.0}}"#,
        );
        let mut store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
        assert_eq!(store.state().progress.experience(), 740);

        store.update_stat("playTime", 1.0);
        assert!(store.flush());
        let record = decode_record(&storage.get(DEFAULT_RECORD_NAME).unwrap()).unwrap();
        assert_eq!(record.experience, 740);
        assert_eq!(record.inventory["materials"]["wood"], 3);
        assert_eq!(record.ecosystem_health["forest"], 12.0);
        assert_eq!(record.player_stats["playTime"], 1.0);
    }
}
