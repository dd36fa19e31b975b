//! Session modes and the transition table.
//!
//! ```text
//! menu --start--> loading --ready--> playing --pause--> paused
//!   ^                                   |  ^               |
//!   |                                   |  +----resume-----+
//!   +-------------toMenu----------------+------------------+
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Menu,
    Loading,
    Playing,
    Paused,
}

impl SessionMode {
    /// Whether the simulator and player controller run in this mode.
    pub fn is_active(self) -> bool {
        self == SessionMode::Playing
    }

    /// Whether the world is on screen (scene collaborator renders).
    pub fn shows_world(self) -> bool {
        matches!(self, SessionMode::Playing | SessionMode::Paused)
    }
}

/// Edges of the session machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Start,
    Ready,
    Pause,
    Resume,
    ToMenu,
}

/// Next mode for an event, or `None` if the event is not valid in `mode`.
pub fn next_mode(mode: SessionMode, event: SessionEvent) -> Option<SessionMode> {
    use SessionEvent as E;
    use SessionMode as M;

    match (mode, event) {
        (M::Menu, E::Start) => Some(M::Loading),
        (M::Loading, E::Ready) => Some(M::Playing),
        (M::Playing, E::Pause) => Some(M::Paused),
        (M::Paused, E::Resume) => Some(M::Playing),
        (M::Playing | M::Paused, E::ToMenu) => Some(M::Menu),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut mode = SessionMode::default();
        for event in [
            SessionEvent::Start,
            SessionEvent::Ready,
            SessionEvent::Pause,
            SessionEvent::Resume,
            SessionEvent::ToMenu,
        ] {
            mode = next_mode(mode, event).unwrap_or_else(|| panic!("{event:?} rejected in {mode:?}"));
        }
        assert_eq!(mode, SessionMode::Menu);
    }

    #[test]
    fn test_invalid_edges_rejected() {
        assert_eq!(next_mode(SessionMode::Menu, SessionEvent::Pause), None);
        assert_eq!(next_mode(SessionMode::Loading, SessionEvent::ToMenu), None);
        assert_eq!(next_mode(SessionMode::Playing, SessionEvent::Resume), None);
        assert_eq!(next_mode(SessionMode::Paused, SessionEvent::Pause), None);
        assert_eq!(next_mode(SessionMode::Menu, SessionEvent::Ready), None);
    }

    #[test]
    fn test_only_playing_is_active() {
        assert!(SessionMode::Playing.is_active());
        assert!(!SessionMode::Paused.is_active());
        assert!(SessionMode::Paused.shows_world());
        assert!(!SessionMode::Loading.shows_world());
    }
}
