//! Static quest catalog.

use crate::ecosystem::EcosystemId;

/// One entry in the quest log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestDef {
    pub id: &'static str,
    pub title: &'static str,
    pub ecosystem: EcosystemId,
    pub objectives: &'static [&'static str],
    /// Experience granted on completion.
    pub reward_experience: u64,
    /// Recipe unlocked on completion, if any.
    pub reward_recipe: Option<&'static str>,
}

pub const QUESTS: &[QuestDef] = &[
    QuestDef {
        id: "cleanup-forest-1",
        title: "Forest Cleanup",
        ecosystem: EcosystemId::Forest,
        objectives: &["Collect 10 pieces of trash", "Plant 5 trees", "Test soil quality"],
        reward_experience: 100,
        reward_recipe: Some("advanced-cleaner"),
    },
    QuestDef {
        id: "ocean-restoration-1",
        title: "Ocean Restoration",
        ecosystem: EcosystemId::Ocean,
        objectives: &[
            "Clean 3 pollution sources",
            "Plant 10 coral fragments",
            "Rescue 5 fish",
        ],
        reward_experience: 150,
        reward_recipe: Some("water-purifier"),
    },
    QuestDef {
        id: "mountain-conservation-1",
        title: "Mountain Conservation",
        ecosystem: EcosystemId::Mountain,
        objectives: &[
            "Remove mining waste",
            "Install wildlife barriers",
            "Monitor air quality",
        ],
        reward_experience: 200,
        reward_recipe: Some("air-quality-monitor"),
    },
];

/// Look up a quest by id.
pub fn find_quest(id: &str) -> Option<&'static QuestDef> {
    QUESTS.iter().find(|q| q.id == id)
}

/// Quests set in a given ecosystem.
pub fn quests_for(ecosystem: EcosystemId) -> impl Iterator<Item = &'static QuestDef> {
    QUESTS.iter().filter(move |q| q.ecosystem == ecosystem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_quest() {
        let q = find_quest("ocean-restoration-1").unwrap();
        assert_eq!(q.reward_experience, 150);
        assert!(find_quest("nope").is_none());
    }

    #[test]
    fn test_quest_ids_unique() {
        let mut ids: Vec<_> = QUESTS.iter().map(|q| q.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), QUESTS.len());
    }

    #[test]
    fn test_no_urban_quests_yet() {
        assert_eq!(quests_for(EcosystemId::Urban).count(), 0);
        assert_eq!(quests_for(EcosystemId::Forest).count(), 1);
    }
}
