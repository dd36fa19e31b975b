//! Transient UI state and the intents the UI dispatches.
//!
//! Panels and notifications never persist. Alerts derived from the current
//! ecosystem are level conditions; [`UiState::observe_alerts`] turns them
//! into one notification per rising edge.

use std::collections::BTreeSet;

use ecowarriors_logic::ecosystem::EcosystemId;
use ecowarriors_logic::session::SessionMode;
use ecowarriors_logic::visuals::EcoAlert;

use crate::input::KeyCode;

/// Everything the UI can ask the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    ToggleInventory,
    ToggleQuestLog,
    ToggleMap,
    ToggleSettings,
    StartQuest(String),
    CompleteQuest(String),
    UpdateSetting {
        category: String,
        key: String,
        value: serde_json::Value,
    },
    SwitchScene(EcosystemId),
    /// Remove pollution from the current ecosystem.
    CleanPollution { amount: f64 },
    StartGame,
    Pause,
    Resume,
    ToMenu { reset_progress: bool },
}

/// Intent bound to a UI hotkey in the given mode.
pub fn hotkey_intent(key: KeyCode, mode: SessionMode) -> Option<Intent> {
    match (key, mode) {
        (KeyCode::Escape, SessionMode::Playing) => Some(Intent::Pause),
        (KeyCode::Escape, SessionMode::Paused) => Some(Intent::Resume),
        (KeyCode::KeyI, SessionMode::Playing) => Some(Intent::ToggleInventory),
        (KeyCode::KeyJ, SessionMode::Playing) => Some(Intent::ToggleQuestLog),
        (KeyCode::KeyM, SessionMode::Playing) => Some(Intent::ToggleMap),
        (KeyCode::Tab, SessionMode::Playing | SessionMode::Paused) => Some(Intent::ToggleSettings),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Alert,
    Notice,
    LevelUp,
    Quest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub show_inventory: bool,
    pub show_quest_log: bool,
    pub show_map: bool,
    pub show_settings: bool,
    notifications: Vec<Notification>,
    next_id: u64,
    raised: BTreeSet<EcoAlert>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a panel toggle. Returns false for intents that are not toggles.
    pub fn toggle(&mut self, intent: &Intent) -> bool {
        let flag = match intent {
            Intent::ToggleInventory => &mut self.show_inventory,
            Intent::ToggleQuestLog => &mut self.show_quest_log,
            Intent::ToggleMap => &mut self.show_map,
            Intent::ToggleSettings => &mut self.show_settings,
            _ => return false,
        };
        *flag = !*flag;
        true
    }

    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notifications.push(Notification {
            id,
            kind,
            message: message.into(),
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    /// Compare this frame's alerts with the last observed set and raise a
    /// notification for each newly active one. Returns the new alerts.
    pub fn observe_alerts(&mut self, ecosystem: EcosystemId, alerts: &[EcoAlert]) -> Vec<EcoAlert> {
        let current: BTreeSet<EcoAlert> = alerts.iter().copied().collect();
        let rising: Vec<EcoAlert> = current.difference(&self.raised).copied().collect();
        for alert in &rising {
            match alert {
                EcoAlert::Critical => self.notify(
                    NotificationKind::Alert,
                    format!("Critical pollution levels in the {ecosystem}!"),
                ),
                EcoAlert::Thriving => self.notify(
                    NotificationKind::Notice,
                    format!("The {ecosystem} ecosystem is thriving!"),
                ),
            };
        }
        self.raised = current;
        rising
    }

    /// Forget observed alerts so the next scene starts fresh.
    pub fn forget_alerts(&mut self) {
        self.raised.clear();
    }

    /// Close every panel and drop notifications (returning to the menu).
    pub fn reset(&mut self) {
        let next_id = self.next_id;
        *self = Self {
            next_id,
            ..Self::default()
        };
    }
}
