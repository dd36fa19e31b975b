//! Persistence boundary: which parts of [`GameState`] survive a restart.
//!
//! Only player progression, settings and ecosystem numbers persist. Pose,
//! session mode and the current scene are rebuilt from defaults on load.
//!
//! The durable record is JSON shaped as `{"state": {...}, "version": 0}` with
//! camelCase keys. Every field is optional on read; anything missing, null
//! or of the wrong type falls back to the default value. Binary snapshots
//! carry the same state behind a bincode version header.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ecowarriors_logic::ecosystem::{initial_ecosystems, EcosystemId, EcosystemState};
use ecowarriors_logic::inventory::Inventory;
use ecowarriors_logic::progression::{level_for_experience, PlayerProgress, StatCounters};
use ecowarriors_logic::settings::Settings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::store::GameState;

/// Name of the durable record unless configured otherwise.
pub const DEFAULT_RECORD_NAME: &str = "eco-warriors-save";

/// Version written into the JSON envelope.
pub const RECORD_VERSION: u32 = 0;

/// Version number for the binary snapshot format (increment when format changes)
pub const SNAPSHOT_VERSION: u32 = 1;

/// The persisted subset of [`GameState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    /// Written for readers of the raw record; recomputed from experience on load.
    pub player_level: u32,
    pub experience: u64,
    pub skill_points: u32,
    pub completed_quests: Vec<String>,
    pub active_quests: Vec<String>,
    pub unlocked_recipes: Vec<String>,
    pub inventory: BTreeMap<String, BTreeMap<String, u32>>,
    pub player_stats: BTreeMap<String, f64>,
    pub settings: Settings,
    pub ecosystem_health: BTreeMap<String, f64>,
    pub pollution_levels: BTreeMap<String, f64>,
}

impl Default for PersistedState {
    fn default() -> Self {
        to_persisted(&GameState::default())
    }
}

/// JSON envelope around [`PersistedState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedRecord {
    pub state: PersistedState,
    pub version: u32,
}

/// Project the persisted subset out of a full state.
pub fn to_persisted(state: &GameState) -> PersistedState {
    let progress = &state.progress;
    let ecosystem_health = state
        .ecosystems
        .iter()
        .map(|(id, eco)| (id.as_str().to_string(), eco.health()))
        .collect();
    let pollution_levels = state
        .ecosystems
        .iter()
        .map(|(id, eco)| (id.as_str().to_string(), eco.pollution()))
        .collect();

    PersistedState {
        player_level: level_for_experience(progress.experience()),
        experience: progress.experience(),
        skill_points: progress.skill_points(),
        completed_quests: progress.completed_quests.iter().cloned().collect(),
        active_quests: progress.active_quests.iter().cloned().collect(),
        unlocked_recipes: progress.unlocked_recipes.iter().cloned().collect(),
        inventory: progress.inventory.categories().clone(),
        player_stats: progress.stats.as_map().clone(),
        settings: state.settings.clone(),
        ecosystem_health,
        pollution_levels,
    }
}

/// Merge a persisted record over `defaults`.
///
/// Transient fields (pose, session mode, current scene) always come from
/// `defaults`. Values are re-validated on the way in: levels are clamped,
/// zero inventory entries dropped, settings normalized and unknown
/// ecosystem keys ignored.
pub fn from_persisted(record: PersistedState, defaults: GameState) -> GameState {
    let mut state = defaults;

    let mut ecosystems = state.ecosystems.clone();
    if ecosystems.is_empty() {
        ecosystems = initial_ecosystems();
    }
    for (id, eco) in ecosystems.iter_mut() {
        let health = lookup_level(&record.ecosystem_health, *id).unwrap_or(eco.health());
        let pollution = lookup_level(&record.pollution_levels, *id).unwrap_or(eco.pollution());
        *eco = EcosystemState::new(health, pollution);
    }
    state.ecosystems = ecosystems;

    state.progress = PlayerProgress::restore(
        record.experience,
        record.skill_points,
        record.completed_quests.into_iter().collect(),
        record.active_quests.into_iter().collect(),
        record.unlocked_recipes.into_iter().collect(),
        Inventory::from_raw(record.inventory),
        StatCounters::from_raw(record.player_stats),
    );
    state.settings = record.settings.normalized();
    state
}

fn lookup_level(levels: &BTreeMap<String, f64>, id: EcosystemId) -> Option<f64> {
    levels
        .iter()
        .find(|(key, _)| key.parse::<EcosystemId>().ok() == Some(id))
        .map(|(_, &value)| value)
}

/// Serialize the persisted subset into the JSON envelope.
pub fn encode_record(state: &GameState) -> Result<String, StorageError> {
    let record = PersistedRecord {
        state: to_persisted(state),
        version: RECORD_VERSION,
    };
    Ok(serde_json::to_string(&record)?)
}

/// Parse a JSON envelope.
///
/// Fields decode one by one over [`PersistedState::default`]: a missing,
/// null or wrong-typed value keeps its default without discarding the rest
/// of the record. A record without the `state` envelope is read as a bare
/// state object. Only text that is not a JSON object is an error.
pub fn decode_record(text: &str) -> Result<PersistedState, StorageError> {
    let root: Value = serde_json::from_str(text)?;
    let Value::Object(mut root) = root else {
        return Err(StorageError::Malformed("record is not a JSON object".into()));
    };
    let fields = match root.remove("state") {
        Some(Value::Object(state)) => state,
        _ => root,
    };
    Ok(merge_fields(&fields))
}

fn merge_fields(fields: &Map<String, Value>) -> PersistedState {
    let mut state = PersistedState::default();
    let field = |key: &str| fields.get(key).filter(|v| !v.is_null());

    if let Some(level) = field("playerLevel").and_then(count) {
        state.player_level = u32::try_from(level).unwrap_or(u32::MAX);
    }
    if let Some(experience) = field("experience").and_then(count) {
        state.experience = experience;
    }
    if let Some(points) = field("skillPoints").and_then(count) {
        state.skill_points = u32::try_from(points).unwrap_or(u32::MAX);
    }
    if let Some(quests) = field("completedQuests").and_then(strings) {
        state.completed_quests = quests;
    }
    if let Some(quests) = field("activeQuests").and_then(strings) {
        state.active_quests = quests;
    }
    if let Some(recipes) = field("unlockedRecipes").and_then(strings) {
        state.unlocked_recipes = recipes;
    }
    if let Some(categories) = field("inventory").and_then(Value::as_object) {
        for (category, items) in categories {
            // A category that is not an item map keeps its default contents.
            let Some(items) = items.as_object() else {
                continue;
            };
            let quantities = items
                .iter()
                .filter_map(|(item, q)| {
                    let q = u32::try_from(count(q)?).ok()?;
                    Some((item.clone(), q))
                })
                .collect();
            state.inventory.insert(category.clone(), quantities);
        }
    }
    if let Some(stats) = field("playerStats").and_then(numbers) {
        state.player_stats = stats;
    }
    if let Some(settings) = field("settings") {
        state.settings = merge_settings(settings);
    }
    if let Some(levels) = field("ecosystemHealth").and_then(numbers) {
        state.ecosystem_health = levels;
    }
    if let Some(levels) = field("pollutionLevels").and_then(numbers) {
        state.pollution_levels = levels;
    }
    state
}

/// Non-negative integer, accepting whole floats such as `740.0`.
fn count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

fn strings(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(items.iter().filter_map(Value::as_str).map(str::to_string).collect())
}

/// Numeric map; null and non-numeric entries are dropped.
fn numbers(value: &Value) -> Option<BTreeMap<String, f64>> {
    let entries = value.as_object()?;
    Some(
        entries
            .iter()
            .filter_map(|(key, v)| Some((key.clone(), v.as_f64()?)))
            .collect(),
    )
}

/// Overlay each saved `section.key` onto the default settings, skipping
/// values the typed schema rejects.
fn merge_settings(saved: &Value) -> Settings {
    let Some(sections) = saved.as_object() else {
        return Settings::default();
    };
    let Ok(mut merged) = serde_json::to_value(Settings::default()) else {
        return Settings::default();
    };
    for (section, entries) in sections {
        let Some(entries) = entries.as_object() else {
            continue;
        };
        for (key, value) in entries {
            if merged.get(section).and_then(|s| s.get(key)).is_none() {
                continue;
            }
            let mut candidate = merged.clone();
            candidate[section.as_str()][key.as_str()] = value.clone();
            if Settings::deserialize(&candidate).is_ok() {
                merged = candidate;
            }
        }
    }
    Settings::deserialize(&merged).unwrap_or_default()
}

/// Write a binary snapshot of the persisted subset.
pub fn export_snapshot<W: Write>(mut writer: W, state: &GameState) -> Result<(), StorageError> {
    bincode::serialize_into(&mut writer, &SNAPSHOT_VERSION)?;
    bincode::serialize_into(&mut writer, &to_persisted(state))?;
    writer.flush()?;
    Ok(())
}

/// Read a binary snapshot written by [`export_snapshot`].
pub fn import_snapshot<R: Read>(mut reader: R) -> Result<PersistedState, StorageError> {
    let version: u32 = bincode::deserialize_from(&mut reader)?;
    if version != SNAPSHOT_VERSION {
        return Err(StorageError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: version,
        });
    }
    Ok(bincode::deserialize_from(reader)?)
}

/// Named durable records.
pub trait StorageBackend {
    /// Read a record. `Ok(None)` when it has never been written.
    fn read(&self, name: &str) -> Result<Option<String>, StorageError>;
    /// Replace a record in full.
    fn write(&mut self, name: &str, contents: &str) -> Result<(), StorageError>;
    fn remove(&mut self, name: &str) -> Result<(), StorageError>;
}

/// In-memory storage. Clones share the same records, so a test can keep a
/// handle, drop the store and reopen it to simulate a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Rc<RefCell<HashMap<String, String>>>,
    read_only: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes fail with a permission error (simulates a full disk or a
    /// revoked quota).
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.records.borrow().get(name).cloned()
    }

    /// Successful writes through the [`StorageBackend`] interface.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn insert(&self, name: &str, contents: &str) {
        self.records
            .borrow_mut()
            .insert(name.to_string(), contents.to_string());
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(name))
    }

    fn write(&mut self, name: &str, contents: &str) -> Result<(), StorageError> {
        if self.read_only.get() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "storage is read-only",
            )
            .into());
        }
        self.insert(name, contents);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), StorageError> {
        self.records.borrow_mut().remove(name);
        Ok(())
    }
}

/// One JSON file per record inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(name)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, name: &str, contents: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        // Write to a sibling then rename so a crash never leaves half a record.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
