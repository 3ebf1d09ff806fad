use anyhow::Result;
use bevy_ecs::prelude::Entity;
use egui::Ui;
use std::any::TypeId;
use std::collections::VecDeque;

use crate::config::StudioConfig;
use crate::dispatch::DispatchOverride;
use crate::host::{
    apply_backing_field, ComponentEditor, DispatchTable, EditorContext, ModificationRecord,
    ModificationTarget, PlayState, UndoStack,
};
use crate::program::ProgramRegistry;
use crate::proxy::ProxyBridge;
use crate::registry::{InspectorModule, RegistryHandle};
use crate::scene::{EditorScene, ScriptComponent};
use crate::undo::UndoRedoHook;

/// The editor shell: owns the scene, the registries, the bridge, and the
/// undo machinery, and drives them from the single UI event loop. All
/// inspector work happens synchronously inside one of its calls.
pub struct EditorShell {
    pub config: StudioConfig,
    pub scene: EditorScene,
    pub programs: ProgramRegistry,
    pub bridge: ProxyBridge,
    registry: RegistryHandle,
    table: DispatchTable,
    override_install: DispatchOverride,
    undo_stack: UndoStack,
    undo_hook: UndoRedoHook,
    play_state: PlayState,
    selected: Option<Entity>,
    active_editor: Option<Box<dyn ComponentEditor>>,
    console: VecDeque<String>,
    repaint_requested: bool,
}

impl EditorShell {
    pub fn new(config: StudioConfig) -> Self {
        Self {
            config,
            scene: EditorScene::new(),
            programs: ProgramRegistry::new(),
            bridge: ProxyBridge::new(),
            registry: RegistryHandle::new(),
            table: DispatchTable::with_builtin_defaults(),
            override_install: DispatchOverride::new(),
            undo_stack: UndoStack::new(),
            undo_hook: UndoRedoHook::new(),
            play_state: PlayState::Editing,
            selected: None,
            active_editor: None,
            console: VecDeque::new(),
            repaint_requested: false,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StudioConfig::default())
    }

    pub fn registry_handle(&self) -> RegistryHandle {
        self.registry.clone()
    }

    /// Builds the behaviour → inspector map from the declarative module
    /// lists. Explicit operation; never re-run implicitly per draw.
    pub fn register_inspector_modules(&mut self, modules: &[InspectorModule]) {
        self.registry.borrow_mut().build(modules);
    }

    pub fn install_override(&mut self) -> Result<()> {
        self.override_install.install(&mut self.table, self.registry.clone())
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn dispatch_table_mut(&mut self) -> &mut DispatchTable {
        &mut self.table
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn set_play_state(&mut self, play_state: PlayState) {
        self.play_state = play_state;
    }

    pub fn selected(&self) -> Option<Entity> {
        self.selected
    }

    /// Changing selection tears down the previous inspector and its proxy;
    /// cached sub-editors are released synchronously.
    pub fn select(&mut self, entity: Option<Entity>) {
        if self.selected == entity {
            return;
        }
        if let Some(previous) = self.selected.take() {
            if let Some(mut editor) = self.active_editor.take() {
                editor.dispose();
            }
            self.bridge.destroy(previous);
        }
        self.selected = entity;
        self.active_editor = None;
    }

    pub fn active_editor(&self) -> Option<&dyn ComponentEditor> {
        self.active_editor.as_deref()
    }

    /// One inspector draw cycle: read-from-backing (proxy creation) happens
    /// before user edits, write-to-backing after, then pending records are
    /// committed through the postprocess hook.
    pub fn inspector_ui(&mut self, ui: &mut Ui) {
        let Some(entity) = self.selected else {
            ui.weak("Nothing selected");
            return;
        };
        if self.scene.world.get::<ScriptComponent>(entity).is_none() {
            ui.weak("Selected entity has no script component");
            return;
        }
        if self.active_editor.is_none() {
            self.active_editor = self.table.instantiate_for(TypeId::of::<ScriptComponent>());
        }
        let Some(mut editor) = self.active_editor.take() else {
            ui.weak("No inspector bound for script components");
            return;
        };

        let mut status = None;
        {
            let mut ctx = EditorContext {
                scene: &mut self.scene,
                programs: &mut self.programs,
                bridge: &mut self.bridge,
                undo: &mut self.undo_stack,
                play_state: self.play_state,
                config: &self.config,
                status: &mut status,
            };
            editor.edit(ui, entity, &mut ctx);
        }
        self.repaint_requested = editor.requires_constant_repaint(self.play_state);
        self.active_editor = Some(editor);

        if let Some(message) = status {
            self.push_console(message);
        }
        self.commit_pending();
    }

    pub fn commit_pending(&mut self) {
        if !self.undo_stack.has_pending() {
            return;
        }
        let records = self.undo_stack.take_pending();
        let records = self.undo_hook.on_postprocess_modifications(
            records,
            &mut self.scene,
            &self.bridge,
            self.play_state,
        );
        self.undo_stack.commit(records);
    }

    pub fn undo(&mut self) {
        let Some(group) = self.undo_stack.pop_undo() else {
            return;
        };
        for record in group.iter().rev() {
            self.apply_record(record, true);
        }
        self.undo_stack.push_redo_group(group);
        self.undo_hook.on_undo_redo(self.selected, &mut self.scene, &self.bridge);
    }

    pub fn redo(&mut self) {
        let Some(group) = self.undo_stack.pop_redo() else {
            return;
        };
        for record in &group {
            self.apply_record(record, false);
        }
        self.undo_stack.push_undo_group(group);
        self.undo_hook.on_undo_redo(self.selected, &mut self.scene, &self.bridge);
    }

    fn apply_record(&mut self, record: &ModificationRecord, revert: bool) {
        let value = if revert { record.previous.as_ref() } else { record.current.as_ref() };
        match record.target {
            ModificationTarget::Proxy(entity) => {
                if let Some(proxy) = self.bridge.proxy_mut(entity) {
                    match value {
                        Some(value) => proxy.set_field(&record.field, value.clone()),
                        None => proxy.remove_field(&record.field),
                    }
                }
            }
            ModificationTarget::Backing(entity) => {
                if let Some(mut component) = self.scene.world.get_mut::<ScriptComponent>(entity) {
                    apply_backing_field(&mut component, &record.field, value);
                }
            }
        }
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    pub fn undo_stack_mut(&mut self) -> &mut UndoStack {
        &mut self.undo_stack
    }

    pub fn repaint_requested(&self) -> bool {
        self.repaint_requested
    }

    pub fn push_console(&mut self, message: impl Into<String>) {
        self.console.push_back(message.into());
        while self.console.len() > self.config.console.capacity {
            self.console.pop_front();
        }
    }

    pub fn console(&self) -> &VecDeque<String> {
        &self.console
    }
}
