use bevy_ecs::prelude::Entity;

use crate::host::{ModificationRecord, ModificationTarget, PlayState};
use crate::proxy::ProxyBridge;
use crate::scene::{EditorScene, ScriptComponent};

/// Process-wide undo listener. Proxies carry a do-not-serialize flag, so the
/// host never dirty-tracks them on its own; this hook marks the containing
/// scene dirty whenever a committed modification touched a proxy.
///
/// Known asymmetry, kept on purpose: undoing such a change does not clear
/// the dirty flag it set.
#[derive(Default)]
pub struct UndoRedoHook;

impl UndoRedoHook {
    pub fn new() -> Self {
        Self
    }

    /// Runs after every undo or redo step: re-synchronizes the currently
    /// inspected component's backing state from its proxy, if one exists.
    pub fn on_undo_redo(
        &self,
        inspected: Option<Entity>,
        scene: &mut EditorScene,
        bridge: &ProxyBridge,
    ) {
        let Some(entity) = inspected else {
            return;
        };
        if bridge.proxy(entity).is_none() {
            return;
        }
        if bridge.sync_to_backing(entity, &mut scene.world) {
            scene.mark_dirty();
        }
    }

    /// Observer over the records about to be committed. Every record passes
    /// through unmodified; proxy-targeted ones dirty the scene while editing.
    pub fn on_postprocess_modifications(
        &self,
        records: Vec<ModificationRecord>,
        scene: &mut EditorScene,
        bridge: &ProxyBridge,
        play_state: PlayState,
    ) -> Vec<ModificationRecord> {
        if !play_state.is_playing() {
            for record in &records {
                if let ModificationTarget::Proxy(entity) = record.target {
                    let backing_exists = bridge.proxy(entity).is_some()
                        && scene.world.get::<ScriptComponent>(entity).is_some();
                    if backing_exists {
                        scene.mark_dirty();
                    }
                }
            }
        }
        records
    }
}
