use egui::Ui;
use std::collections::BTreeMap;

use crate::program::ProgramRegistry;
use crate::scene::{ScriptComponent, SyncMode};
use crate::value::FieldValue;

/// Program-source row. Returns true when the caller should stop drawing the
/// rest of the inspector (no source assigned).
pub fn draw_program_source(ui: &mut Ui, component: &mut ScriptComponent) -> bool {
    let mut path = component.program.clone().unwrap_or_default();
    ui.horizontal(|ui| {
        ui.label("Program Source");
        if ui.text_edit_singleline(&mut path).changed() {
            let trimmed = path.trim();
            component.program = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
        }
    });
    if component.program.is_none() {
        ui.colored_label(egui::Color32::YELLOW, "Assign a behaviour script to edit this component");
        return true;
    }
    false
}

pub fn draw_sync_settings(ui: &mut Ui, component: &mut ScriptComponent) {
    ui.horizontal(|ui| {
        ui.label("Sync Mode");
        egui::ComboBox::from_id_salt("script_sync_mode")
            .selected_text(component.sync.mode.label())
            .show_ui(ui, |ui| {
                for mode in [SyncMode::None, SyncMode::Continuous, SyncMode::Manual] {
                    ui.selectable_value(&mut component.sync.mode, mode, mode.label());
                }
            });
    });
    ui.checkbox(&mut component.sync.sync_position, "Synchronize Position");
}

pub fn draw_interact_settings(ui: &mut Ui, component: &mut ScriptComponent) {
    ui.horizontal(|ui| {
        ui.label("Interaction Text");
        ui.text_edit_singleline(&mut component.interact.text);
    });
    ui.horizontal(|ui| {
        ui.label("Proximity");
        ui.add(egui::DragValue::new(&mut component.interact.proximity).speed(0.05));
    });
}

pub fn draw_utilities(
    ui: &mut Ui,
    component: &mut ScriptComponent,
    programs: &mut ProgramRegistry,
    status: &mut Option<String>,
) {
    ui.horizontal(|ui| {
        if ui.button("Reload Script").clicked() {
            if let Some(path) = &component.program {
                programs.force_reload(path);
                *status = Some(format!("Reloaded {path}"));
            }
        }
        if ui.button("Clear Saved Values").clicked() {
            component.values.clear();
            *status = Some("Cleared saved public variables".to_string());
        }
    });
}

pub fn draw_ui_line(ui: &mut Ui) {
    ui.add_space(4.0);
    ui.separator();
    ui.add_space(4.0);
}

pub fn draw_compile_errors(ui: &mut Ui, error: Option<&str>) {
    if let Some(error) = error {
        ui.colored_label(egui::Color32::LIGHT_RED, "Compile error");
        ui.monospace(error);
    }
}

/// Editors for the behaviour's declared public variables, backed directly by
/// the component's saved values. Returns true when any value changed.
pub fn draw_public_variables(
    ui: &mut Ui,
    component: &mut ScriptComponent,
    declared: &BTreeMap<String, FieldValue>,
) -> bool {
    let mut dirty = false;
    if declared.is_empty() && component.values.is_empty() {
        ui.weak("No public variables");
        return false;
    }
    // Declared fields drive the layout; saved values fill in the current
    // state, stale saved keys are shown untouched below.
    for (name, default) in declared {
        let mut value = component.values.get(name).cloned().unwrap_or_else(|| default.clone());
        if draw_field_editor(ui, name, &mut value) {
            component.values.insert(name.clone(), value);
            dirty = true;
        }
    }
    for (name, value) in &component.values {
        if !declared.contains_key(name) {
            ui.horizontal(|ui| {
                ui.label(name);
                ui.weak(format!("(stale, {})", value.kind()));
            });
        }
    }
    dirty
}

fn draw_field_editor(ui: &mut Ui, name: &str, value: &mut FieldValue) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(name);
        match value {
            FieldValue::Bool(flag) => {
                changed = ui.checkbox(flag, "").changed();
            }
            FieldValue::Int(int) => {
                changed = ui.add(egui::DragValue::new(int)).changed();
            }
            FieldValue::Float(float) => {
                changed = ui.add(egui::DragValue::new(float).speed(0.01)).changed();
            }
            FieldValue::Str(text) => {
                changed = ui.text_edit_singleline(text).changed();
            }
            FieldValue::Vec2(vec) => {
                changed = ui.add(egui::DragValue::new(&mut vec.x).speed(0.01)).changed()
                    | ui.add(egui::DragValue::new(&mut vec.y).speed(0.01)).changed();
            }
            FieldValue::Entity(bits) => {
                ui.monospace(format!("entity {bits}"));
            }
            FieldValue::Asset(path) => {
                changed = ui.text_edit_singleline(path).changed();
            }
        }
    });
    changed
}
