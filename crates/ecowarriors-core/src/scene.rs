//! Scene collaborator seam.
//!
//! Scene geometry lives outside this crate. The engine asks a scene to
//! prepare while loading and hands it derived visual parameters every frame
//! the world is on screen.

use ecowarriors_logic::ecosystem::EcosystemId;
use ecowarriors_logic::visuals::VisualParams;

pub trait SceneCollaborator {
    /// Called every loading frame until it returns true.
    fn prepare(&mut self, ecosystem: EcosystemId) -> bool;
    /// Draw one frame.
    fn render(&mut self, ecosystem: EcosystemId, visuals: &VisualParams);
}

/// Scene that is always ready and draws nothing (headless runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScene;

impl SceneCollaborator for NullScene {
    fn prepare(&mut self, _ecosystem: EcosystemId) -> bool {
        true
    }

    fn render(&mut self, _ecosystem: EcosystemId, _visuals: &VisualParams) {}
}
