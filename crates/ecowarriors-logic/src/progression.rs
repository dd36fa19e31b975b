//! Player progression: experience, levels, skill points, quests, stats.
//!
//! # Levels
//!
//! Level is derived from experience: `level = experience / 100 + 1`.
//! Every level gained grants one skill point.
//!
//! ```
//! use ecowarriors_logic::progression::PlayerProgress;
//!
//! let mut progress = PlayerProgress::default();
//! progress.add_experience(250);
//! assert_eq!(progress.level(), 3);
//! assert_eq!(progress.skill_points(), 2);
//! ```
//!
//! # Quests
//!
//! Active and completed quest sets are disjoint. Completing moves a quest
//! between them in one step; operations on the wrong set are no-ops.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::inventory::Inventory;

/// Experience needed per level.
pub const EXPERIENCE_PER_LEVEL: u64 = 100;

/// Counters every profile starts with.
pub const DEFAULT_STATS: [&str; 5] = [
    "totalCleaned",
    "treesPlanted",
    "speciesSaved",
    "areasRestored",
    "playTime",
];

/// Level for a given experience total.
pub fn level_for_experience(experience: u64) -> u32 {
    (experience / EXPERIENCE_PER_LEVEL + 1).min(u32::MAX as u64) as u32
}

/// Experience progress within the current level, 0.0-1.0 (HUD bar).
pub fn level_progress(experience: u64) -> f32 {
    (experience % EXPERIENCE_PER_LEVEL) as f32 / EXPERIENCE_PER_LEVEL as f32
}

/// Named additive counters. Values never decrease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatCounters(BTreeMap<String, f64>);

impl Default for StatCounters {
    fn default() -> Self {
        Self(DEFAULT_STATS.iter().map(|s| (s.to_string(), 0.0)).collect())
    }
}

impl StatCounters {
    /// Merge persisted counters over the defaults, dropping invalid values.
    pub fn from_raw(raw: BTreeMap<String, f64>) -> Self {
        let mut stats = Self::default();
        for (name, value) in raw {
            if value.is_finite() && value >= 0.0 {
                stats.0.insert(name, value);
            }
        }
        stats
    }

    /// Add `delta` to a counter. Only positive finite deltas are accepted.
    pub fn add(&mut self, name: &str, delta: f64) -> bool {
        if !(delta.is_finite() && delta > 0.0) {
            return false;
        }
        *self.0.entry(name.to_string()).or_insert(0.0) += delta;
        true
    }

    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}

/// Levels gained by an experience award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceGain {
    pub old_level: u32,
    pub new_level: u32,
}

impl ExperienceGain {
    pub fn levels_gained(&self) -> u32 {
        self.new_level.saturating_sub(self.old_level)
    }
}

/// Singleton progression record.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProgress {
    level: u32,
    experience: u64,
    skill_points: u32,
    pub completed_quests: BTreeSet<String>,
    pub active_quests: BTreeSet<String>,
    pub unlocked_recipes: BTreeSet<String>,
    pub inventory: Inventory,
    pub stats: StatCounters,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            skill_points: 0,
            completed_quests: BTreeSet::new(),
            active_quests: BTreeSet::new(),
            unlocked_recipes: BTreeSet::new(),
            inventory: Inventory::default(),
            stats: StatCounters::default(),
        }
    }
}

impl PlayerProgress {
    /// Restore progression from persisted numbers. The level is recomputed
    /// from experience; quests found in both sets count as completed.
    pub fn restore(
        experience: u64,
        skill_points: u32,
        completed_quests: BTreeSet<String>,
        mut active_quests: BTreeSet<String>,
        unlocked_recipes: BTreeSet<String>,
        inventory: Inventory,
        stats: StatCounters,
    ) -> Self {
        active_quests.retain(|q| !completed_quests.contains(q));
        Self {
            level: level_for_experience(experience),
            experience,
            skill_points,
            completed_quests,
            active_quests,
            unlocked_recipes,
            inventory,
            stats,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn skill_points(&self) -> u32 {
        self.skill_points
    }

    /// Award experience. Returns `None` for a zero award.
    pub fn add_experience(&mut self, amount: u64) -> Option<ExperienceGain> {
        if amount == 0 {
            return None;
        }
        let old_level = self.level;
        self.experience = self.experience.saturating_add(amount);
        let new_level = level_for_experience(self.experience);
        if new_level > old_level {
            self.skill_points = self.skill_points.saturating_add(new_level - old_level);
        }
        self.level = new_level;
        Some(ExperienceGain {
            old_level,
            new_level,
        })
    }

    /// Start a quest unless it is already active or completed.
    pub fn start_quest(&mut self, quest_id: &str) -> bool {
        if self.active_quests.contains(quest_id) || self.completed_quests.contains(quest_id) {
            return false;
        }
        self.active_quests.insert(quest_id.to_string())
    }

    /// Move an active quest to completed. Quests that are not active are
    /// left alone.
    pub fn complete_quest(&mut self, quest_id: &str) -> bool {
        if !self.active_quests.remove(quest_id) {
            return false;
        }
        self.completed_quests.insert(quest_id.to_string());
        true
    }

    pub fn unlock_recipe(&mut self, recipe_id: &str) -> bool {
        self.unlocked_recipes.insert(recipe_id.to_string())
    }
}
