use bevy_ecs::prelude::Entity;
use egui::Ui;
use std::any::Any;
use std::collections::BTreeMap;

use crate::gui;
use crate::host::{
    backing_snapshot, create_cached_editor, diff_fields, CachedEditor, CachedEditorKey,
    ComponentEditor, DefaultScriptEditor, EditorContext, ModificationTarget, PlayState,
};
use crate::program::is_behaviour_source;
use crate::registry::{InspectorContext, RegistryHandle};
use crate::scene::ScriptComponent;
use crate::value::FieldValue;

pub const OVERRIDE_EDITOR_NAME: &str = "OverrideInspector";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectorState {
    Uninitialized,
    DelegatingDefault,
    DelegatingCustom(String),
    FallbackGeneric,
}

/// The single editor every script component routes through once the
/// dispatch override is installed. Decides per draw whether to delegate to
/// the host's default editor, a registered custom inspector working against
/// the proxy, or the generic fallback layout.
pub struct OverrideInspector {
    registry: RegistryHandle,
    state: InspectorState,
    cached: Option<CachedEditor>,
}

impl OverrideInspector {
    pub fn new(registry: RegistryHandle) -> Self {
        Self { registry, state: InspectorState::Uninitialized, cached: None }
    }

    pub fn state(&self) -> &InspectorState {
        &self.state
    }

    fn delegate_default(&mut self, ui: &mut Ui, entity: Entity, ctx: &mut EditorContext<'_>) {
        self.state = InspectorState::DelegatingDefault;
        // No resolved behaviour means no proxy; a stale one left behind would
        // keep feeding old field values to the undo resync.
        ctx.bridge.destroy(entity);
        create_cached_editor(&mut self.cached, &CachedEditorKey::BuiltinDefault, || {
            CachedEditor::Default(Box::new(DefaultScriptEditor))
        });
        if let Some(CachedEditor::Default(editor)) = self.cached.as_mut() {
            editor.edit(ui, entity, ctx);
        }
    }

    fn draw_custom(
        &mut self,
        ui: &mut Ui,
        entity: Entity,
        ctx: &mut EditorContext<'_>,
        behaviour: &str,
        declared: &BTreeMap<String, FieldValue>,
        component: &ScriptComponent,
        compile_error: Option<&str>,
    ) {
        self.state = InspectorState::DelegatingCustom(behaviour.to_string());

        let factory = {
            let registry = self.registry.borrow();
            match registry.resolve(behaviour) {
                Some(binding) => binding.factory(),
                None => return,
            }
        };
        let key = CachedEditorKey::Custom(behaviour.to_string());
        create_cached_editor(&mut self.cached, &key, || CachedEditor::Custom {
            behaviour: behaviour.to_string(),
            inspector: factory(),
        });

        let proxy = ctx.bridge.get_or_create(entity, behaviour, declared, component);
        // The proxy must never run engine-side behaviour of its own.
        proxy.enabled = false;

        let before = proxy.fields.clone();
        if let Some(CachedEditor::Custom { inspector, .. }) = self.cached.as_mut() {
            inspector.refresh(proxy);
            let mut inspector_ctx =
                InspectorContext { play_state: ctx.play_state, compile_error };
            inspector.edit(ui, proxy, &mut inspector_ctx);
        }
        for record in diff_fields(ModificationTarget::Proxy(entity), &before, &proxy.fields) {
            ctx.undo.push_pending(record);
        }

        // Write path runs strictly after the inspector applied this frame's
        // edits; a sync that changes nothing must not dirty the scene.
        let changed = ctx.bridge.sync_to_backing(entity, &mut ctx.scene.world);
        if changed {
            ctx.scene.mark_dirty();
        }
    }

    fn draw_fallback(
        &mut self,
        ui: &mut Ui,
        entity: Entity,
        ctx: &mut EditorContext<'_>,
        original: &ScriptComponent,
        declared: &BTreeMap<String, FieldValue>,
        compile_error: Option<&str>,
    ) {
        self.state = InspectorState::FallbackGeneric;
        self.cached = None;
        ctx.bridge.destroy(entity);

        let mut edited = original.clone();
        let before = backing_snapshot(&edited);

        let stop = gui::draw_program_source(ui, &mut edited);
        if !stop {
            gui::draw_sync_settings(ui, &mut edited);
            gui::draw_interact_settings(ui, &mut edited);
            gui::draw_utilities(ui, &mut edited, ctx.programs, ctx.status);
            gui::draw_ui_line(ui);
            gui::draw_compile_errors(ui, compile_error);
            let _ = gui::draw_public_variables(ui, &mut edited, declared);
        }

        let after = backing_snapshot(&edited);
        if after != before {
            for record in diff_fields(ModificationTarget::Backing(entity), &before, &after) {
                ctx.undo.push_pending(record);
            }
            if let Some(mut component) = ctx.scene.world.get_mut::<ScriptComponent>(entity) {
                *component = edited;
            }
            ctx.scene.mark_dirty();
        }
    }
}

impl ComponentEditor for OverrideInspector {
    fn edit(&mut self, ui: &mut Ui, entity: Entity, ctx: &mut EditorContext<'_>) {
        let Some(component) = ctx.scene.world.get::<ScriptComponent>(entity).cloned() else {
            ui.weak("Selected entity has no script component");
            return;
        };

        // Not a behaviour program asset: hand the component to the host's
        // original editor for this component's lifetime.
        let Some(path) = component.program.clone() else {
            self.delegate_default(ui, entity, ctx);
            return;
        };
        if !is_behaviour_source(&path) {
            self.delegate_default(ui, entity, ctx);
            return;
        }

        // Pick up on-disk edits before resolving; a recompile may rename the
        // behaviour, and the bridge drops the stale proxy when asked for it.
        ctx.programs.reload_if_changed(&path);
        let (behaviour, declared, compile_error) = {
            let program = ctx.programs.get_or_load(&path);
            (
                program.behaviour_name().map(str::to_string),
                program.fields().clone(),
                program.compile_error().map(str::to_string),
            )
        };

        let bound = behaviour
            .as_deref()
            .map_or(false, |name| self.registry.borrow().resolve(name).is_some());

        match behaviour {
            Some(name) if bound => self.draw_custom(
                ui,
                entity,
                ctx,
                &name,
                &declared,
                &component,
                compile_error.as_deref(),
            ),
            _ => self.draw_fallback(
                ui,
                entity,
                ctx,
                &component,
                &declared,
                compile_error.as_deref(),
            ),
        }
    }

    fn requires_constant_repaint(&self, play_state: PlayState) -> bool {
        play_state.is_playing()
    }

    fn dispose(&mut self) {
        self.cached = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
