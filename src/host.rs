use bevy_ecs::prelude::Entity;
use egui::Ui;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use crate::config::StudioConfig;
use crate::program::ProgramRegistry;
use crate::proxy::ProxyBridge;
use crate::scene::{EditorScene, ScriptComponent, SyncMode};
use crate::value::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Editing,
    Playing,
}

impl PlayState {
    pub fn is_playing(self) -> bool {
        matches!(self, PlayState::Playing)
    }
}

/// Everything a dispatch-level editor may touch during one draw cycle.
/// Fields are disjoint borrows of the shell, so editors can use them freely.
pub struct EditorContext<'a> {
    pub scene: &'a mut EditorScene,
    pub programs: &'a mut ProgramRegistry,
    pub bridge: &'a mut ProxyBridge,
    pub undo: &'a mut UndoStack,
    pub play_state: PlayState,
    pub config: &'a StudioConfig,
    pub status: &'a mut Option<String>,
}

/// Dispatch-level editor bound to a component type through the dispatch
/// table. The override inspector implements this, as does the host's
/// built-in default editor.
pub trait ComponentEditor {
    fn edit(&mut self, ui: &mut Ui, entity: Entity, ctx: &mut EditorContext<'_>);

    fn requires_constant_repaint(&self, play_state: PlayState) -> bool {
        let _ = play_state;
        false
    }

    /// Synchronously releases any cached sub-editor instances.
    fn dispose(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub type ComponentEditorFactory = Box<dyn Fn() -> Box<dyn ComponentEditor>>;

pub struct InspectorBinding {
    pub editor_name: &'static str,
    pub builtin: bool,
    factory: ComponentEditorFactory,
}

impl InspectorBinding {
    pub fn new(
        editor_name: &'static str,
        builtin: bool,
        factory: impl Fn() -> Box<dyn ComponentEditor> + 'static,
    ) -> Self {
        Self { editor_name, builtin, factory: Box::new(factory) }
    }

    pub fn instantiate(&self) -> Box<dyn ComponentEditor> {
        (self.factory)()
    }
}

pub const DEFAULT_EDITOR_NAME: &str = "DefaultScriptEditor";

/// The host's component-type → inspector bindings. The host seeds one
/// built-in binding per editable component type; the override installer
/// rewrites the entry for `ScriptComponent` exactly once.
pub struct DispatchTable {
    bindings: HashMap<TypeId, Vec<InspectorBinding>>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::with_builtin_defaults()
    }
}

impl DispatchTable {
    pub fn empty() -> Self {
        Self { bindings: HashMap::new() }
    }

    pub fn with_builtin_defaults() -> Self {
        let mut table = Self::empty();
        table.add_binding(
            TypeId::of::<ScriptComponent>(),
            InspectorBinding::new(DEFAULT_EDITOR_NAME, true, || Box::new(DefaultScriptEditor)),
        );
        table
    }

    pub fn add_binding(&mut self, component: TypeId, binding: InspectorBinding) {
        self.bindings.entry(component).or_default().push(binding);
    }

    pub fn remove_bindings(&mut self, component: TypeId) -> usize {
        self.bindings.remove(&component).map_or(0, |list| list.len())
    }

    pub fn bindings_for(&self, component: TypeId) -> &[InspectorBinding] {
        self.bindings.get(&component).map_or(&[], Vec::as_slice)
    }

    pub fn instantiate_for(&self, component: TypeId) -> Option<Box<dyn ComponentEditor>> {
        self.bindings_for(component).first().map(InspectorBinding::instantiate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedEditorKey {
    BuiltinDefault,
    Custom(String),
}

pub enum CachedEditor {
    Default(Box<dyn ComponentEditor>),
    Custom { behaviour: String, inspector: Box<dyn crate::registry::BehaviourInspector> },
}

impl CachedEditor {
    pub fn key(&self) -> CachedEditorKey {
        match self {
            CachedEditor::Default(_) => CachedEditorKey::BuiltinDefault,
            CachedEditor::Custom { behaviour, .. } => CachedEditorKey::Custom(behaviour.clone()),
        }
    }
}

/// Cached-editor primitive: reuses the slot while the key matches, otherwise
/// drops the stale instance and builds a fresh one.
pub fn create_cached_editor(
    slot: &mut Option<CachedEditor>,
    key: &CachedEditorKey,
    make: impl FnOnce() -> CachedEditor,
) {
    let stale = slot.as_ref().map_or(true, |cached| cached.key() != *key);
    if stale {
        *slot = Some(make());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationTarget {
    /// A transient editing proxy; the entity identifies its backing component.
    Proxy(Entity),
    Backing(Entity),
}

/// One field change about to be committed as part of an undo step. `None`
/// means the field was absent on that side.
#[derive(Debug, Clone, PartialEq)]
pub struct ModificationRecord {
    pub target: ModificationTarget,
    pub field: String,
    pub previous: Option<FieldValue>,
    pub current: Option<FieldValue>,
}

#[derive(Default)]
pub struct UndoStack {
    pending: Vec<ModificationRecord>,
    undo_groups: Vec<Vec<ModificationRecord>>,
    redo_groups: Vec<Vec<ModificationRecord>>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_pending(&mut self, record: ModificationRecord) {
        self.pending.push(record);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn take_pending(&mut self) -> Vec<ModificationRecord> {
        std::mem::take(&mut self.pending)
    }

    pub fn commit(&mut self, group: Vec<ModificationRecord>) {
        if group.is_empty() {
            return;
        }
        self.undo_groups.push(group);
        self.redo_groups.clear();
    }

    pub fn pop_undo(&mut self) -> Option<Vec<ModificationRecord>> {
        self.undo_groups.pop()
    }

    pub fn pop_redo(&mut self) -> Option<Vec<ModificationRecord>> {
        self.redo_groups.pop()
    }

    pub fn push_undo_group(&mut self, group: Vec<ModificationRecord>) {
        self.undo_groups.push(group);
    }

    pub fn push_redo_group(&mut self, group: Vec<ModificationRecord>) {
        self.redo_groups.push(group);
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_groups.len()
    }
}

// Built-in component state travels through the same record stream as public
// variables, under reserved names that cannot collide with script fields.
pub const FIELD_PROGRAM: &str = "@program";
pub const FIELD_ENABLED: &str = "@enabled";
pub const FIELD_SYNC_MODE: &str = "@sync.mode";
pub const FIELD_SYNC_POSITION: &str = "@sync.position";
pub const FIELD_INTERACT_TEXT: &str = "@interact.text";
pub const FIELD_INTERACT_PROXIMITY: &str = "@interact.proximity";

pub fn backing_snapshot(component: &ScriptComponent) -> BTreeMap<String, FieldValue> {
    let mut snapshot = component.values.clone();
    snapshot.insert(
        FIELD_PROGRAM.to_string(),
        FieldValue::Str(component.program.clone().unwrap_or_default()),
    );
    snapshot.insert(FIELD_ENABLED.to_string(), FieldValue::Bool(component.enabled));
    snapshot.insert(
        FIELD_SYNC_MODE.to_string(),
        FieldValue::Str(component.sync.mode.label().to_string()),
    );
    snapshot.insert(FIELD_SYNC_POSITION.to_string(), FieldValue::Bool(component.sync.sync_position));
    snapshot.insert(FIELD_INTERACT_TEXT.to_string(), FieldValue::Str(component.interact.text.clone()));
    snapshot.insert(
        FIELD_INTERACT_PROXIMITY.to_string(),
        FieldValue::Float(f64::from(component.interact.proximity)),
    );
    snapshot
}

pub fn apply_backing_field(component: &mut ScriptComponent, field: &str, value: Option<&FieldValue>) {
    match (field, value) {
        (FIELD_PROGRAM, Some(FieldValue::Str(path))) => {
            component.program = if path.is_empty() { None } else { Some(path.clone()) };
        }
        (FIELD_ENABLED, Some(FieldValue::Bool(enabled))) => component.enabled = *enabled,
        (FIELD_SYNC_MODE, Some(FieldValue::Str(label))) => {
            for mode in [SyncMode::None, SyncMode::Continuous, SyncMode::Manual] {
                if mode.label() == label {
                    component.sync.mode = mode;
                }
            }
        }
        (FIELD_SYNC_POSITION, Some(FieldValue::Bool(sync))) => component.sync.sync_position = *sync,
        (FIELD_INTERACT_TEXT, Some(FieldValue::Str(text))) => component.interact.text = text.clone(),
        (FIELD_INTERACT_PROXIMITY, Some(FieldValue::Float(proximity))) => {
            component.interact.proximity = *proximity as f32;
        }
        (name, Some(value)) if !name.starts_with('@') => {
            component.values.insert(name.to_string(), value.clone());
        }
        (name, None) if !name.starts_with('@') => {
            component.values.remove(name);
        }
        _ => {}
    }
}

pub fn diff_fields(
    target: ModificationTarget,
    before: &BTreeMap<String, FieldValue>,
    after: &BTreeMap<String, FieldValue>,
) -> Vec<ModificationRecord> {
    let mut records = Vec::new();
    for (field, previous) in before {
        match after.get(field) {
            Some(current) if current != previous => records.push(ModificationRecord {
                target,
                field: field.clone(),
                previous: Some(previous.clone()),
                current: Some(current.clone()),
            }),
            Some(_) => {}
            None => records.push(ModificationRecord {
                target,
                field: field.clone(),
                previous: Some(previous.clone()),
                current: None,
            }),
        }
    }
    for (field, current) in after {
        if !before.contains_key(field) {
            records.push(ModificationRecord {
                target,
                field: field.clone(),
                previous: None,
                current: Some(current.clone()),
            });
        }
    }
    records
}

/// The host's original inspector for plain script components: a raw
/// serialized view with no proxy or behaviour awareness.
pub struct DefaultScriptEditor;

impl ComponentEditor for DefaultScriptEditor {
    fn edit(&mut self, ui: &mut Ui, entity: Entity, ctx: &mut EditorContext<'_>) {
        let Some(component) = ctx.scene.world.get::<ScriptComponent>(entity) else {
            ui.weak("Selected entity has no script component");
            return;
        };
        let mut edited = component.clone();
        let before = backing_snapshot(&edited);

        ui.heading("Script Component");
        let mut path = edited.program.clone().unwrap_or_default();
        ui.horizontal(|ui| {
            ui.label("Program");
            if ui.text_edit_singleline(&mut path).changed() {
                let trimmed = path.trim();
                edited.program = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
            }
        });
        ui.checkbox(&mut edited.enabled, "Enabled");
        if !edited.values.is_empty() {
            ui.separator();
            for (name, value) in &edited.values {
                ui.monospace(format!("{name}: {value:?}"));
            }
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

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
