use std::cell::RefCell;
use std::fs;

use egui::Ui;
use script_inspector::host::PlayState;
use script_inspector::inspector::{InspectorState, OverrideInspector};
use script_inspector::proxy::ProxyInstance;
use script_inspector::registry::{
    BehaviourInspector, InspectorContext, InspectorDeclaration, InspectorModule,
};
use script_inspector::scene::ScriptComponent;
use script_inspector::value::FieldValue;
use script_inspector::EditorShell;
use tempfile::TempDir;

thread_local! {
    static QUEUED_EDITS: RefCell<Vec<(String, FieldValue)>> = RefCell::new(Vec::new());
    static EDIT_CALLS: RefCell<usize> = RefCell::new(0);
}

fn queue_edit(name: &str, value: FieldValue) {
    QUEUED_EDITS.with(|queue| queue.borrow_mut().push((name.to_string(), value)));
}

fn edit_calls() -> usize {
    EDIT_CALLS.with(|count| *count.borrow())
}

/// Test inspector that applies queued field edits to the proxy, standing in
/// for a user dragging widgets.
struct GaugeInspector;

impl BehaviourInspector for GaugeInspector {
    fn edit(&mut self, _ui: &mut Ui, proxy: &mut ProxyInstance, _ctx: &mut InspectorContext<'_>) {
        EDIT_CALLS.with(|count| *count.borrow_mut() += 1);
        QUEUED_EDITS.with(|queue| {
            for (name, value) in queue.borrow_mut().drain(..) {
                proxy.set_field(&name, value);
            }
        });
    }
}

fn gauge_inspector() -> Box<dyn BehaviourInspector> {
    Box::new(GaugeInspector)
}

fn gauge_module() -> InspectorModule {
    InspectorModule {
        name: "gauges",
        declarations: vec![InspectorDeclaration {
            behaviour: "gauge".to_string(),
            inspector_name: "GaugeInspector",
            factory: gauge_inspector,
        }],
    }
}

fn write_script(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write script");
    path.to_string_lossy().into_owned()
}

fn gauge_script(dir: &TempDir) -> String {
    write_script(
        dir,
        "gauge.rhai",
        "fn defaults() { #{ level: 1 } }\nfn process(world, entity, dt) { }\n",
    )
}

fn run_frame(shell: &mut EditorShell) {
    let ctx = egui::Context::default();
    let _ = ctx.run(egui::RawInput::default(), |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| shell.inspector_ui(ui));
    });
}

fn inspector_state(shell: &EditorShell) -> InspectorState {
    shell
        .active_editor()
        .expect("an inspector should be active after a draw")
        .as_any()
        .downcast_ref::<OverrideInspector>()
        .expect("the dispatch override should route to the override inspector")
        .state()
        .clone()
}

fn shell_with_gauge(dir: &TempDir) -> (EditorShell, bevy_ecs::prelude::Entity) {
    let path = gauge_script(dir);
    let mut shell = EditorShell::with_defaults();
    shell.register_inspector_modules(&[gauge_module()]);
    shell.install_override().expect("override install should succeed");

    let entity = shell.scene.spawn_script_entity(ScriptComponent::with_program(path));
    shell.select(Some(entity));
    (shell, entity)
}

#[test]
fn registered_behaviour_routes_to_the_custom_inspector() {
    let dir = TempDir::new().expect("temp dir");
    let (mut shell, entity) = shell_with_gauge(&dir);

    run_frame(&mut shell);
    assert_eq!(inspector_state(&shell), InspectorState::DelegatingCustom("gauge".to_string()));
    assert_eq!(edit_calls(), 1);
    assert!(!shell.scene.is_dirty(), "a draw without edits must not dirty the scene");
    assert_eq!(shell.undo_stack().undo_depth(), 0);
    assert_eq!(shell.bridge.proxy_count(), 1);
    assert_eq!(
        shell.bridge.proxy(entity).expect("proxy").field("level"),
        Some(&FieldValue::Int(1))
    );
    assert!(!shell.bridge.proxy(entity).expect("proxy").enabled, "proxies never execute");
}

#[test]
fn selecting_a_fresh_component_leaves_the_backing_untouched() {
    let dir = TempDir::new().expect("temp dir");
    let (mut shell, entity) = shell_with_gauge(&dir);

    run_frame(&mut shell);
    let backing = shell.scene.world.get::<ScriptComponent>(entity).expect("backing component");
    assert!(backing.values.is_empty(), "selection must not materialize unsaved defaults");
    assert!(!shell.scene.is_dirty());
    assert_eq!(shell.undo_stack().undo_depth(), 0);
}

#[test]
fn custom_inspector_edits_flow_to_backing_undo_and_dirty() {
    let dir = TempDir::new().expect("temp dir");
    let (mut shell, entity) = shell_with_gauge(&dir);
    run_frame(&mut shell);

    queue_edit("level", FieldValue::Int(2));
    run_frame(&mut shell);

    let backing = shell.scene.world.get::<ScriptComponent>(entity).expect("backing component");
    assert_eq!(backing.values.get("level"), Some(&FieldValue::Int(2)));
    assert!(shell.scene.is_dirty());
    assert_eq!(shell.undo_stack().undo_depth(), 1);

    shell.undo();
    let backing = shell.scene.world.get::<ScriptComponent>(entity).expect("backing component");
    assert_eq!(backing.values.get("level"), Some(&FieldValue::Int(1)));
    assert_eq!(
        shell.bridge.proxy(entity).expect("proxy").field("level"),
        Some(&FieldValue::Int(1))
    );
    assert!(shell.scene.is_dirty(), "undo keeps the dirty flag");

    shell.redo();
    let backing = shell.scene.world.get::<ScriptComponent>(entity).expect("backing component");
    assert_eq!(backing.values.get("level"), Some(&FieldValue::Int(2)));
}

#[test]
fn the_cached_inspector_instance_is_reused_across_frames() {
    let dir = TempDir::new().expect("temp dir");
    let (mut shell, _) = shell_with_gauge(&dir);

    run_frame(&mut shell);
    run_frame(&mut shell);
    run_frame(&mut shell);
    assert_eq!(edit_calls(), 3);
    assert_eq!(shell.bridge.proxy_count(), 1, "the proxy is reused, never duplicated");
}

#[test]
fn unbound_behaviour_falls_back_to_the_generic_layout() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_script(
        &dir,
        "spinner.rhai",
        "fn defaults() { #{ speed: 0.5 } }\nfn process(world, entity, dt) { }\n",
    );

    let mut shell = EditorShell::with_defaults();
    shell.register_inspector_modules(&[gauge_module()]);
    shell.install_override().expect("override install should succeed");
    let entity = shell.scene.spawn_script_entity(ScriptComponent::with_program(path));
    shell.select(Some(entity));

    run_frame(&mut shell);
    assert_eq!(inspector_state(&shell), InspectorState::FallbackGeneric);
    assert_eq!(edit_calls(), 0, "no custom inspector may run for an unbound behaviour");
    assert!(!shell.scene.is_dirty());
    assert_eq!(shell.bridge.proxy_count(), 0, "the fallback edits the backing state directly");
}

#[test]
fn components_without_a_behaviour_program_delegate_to_the_default_editor() {
    let mut shell = EditorShell::with_defaults();
    shell.register_inspector_modules(&[gauge_module()]);
    shell.install_override().expect("override install should succeed");

    let bare = shell.scene.spawn_script_entity(ScriptComponent::default());
    shell.select(Some(bare));
    run_frame(&mut shell);
    assert_eq!(inspector_state(&shell), InspectorState::DelegatingDefault);

    let foreign = shell.scene.spawn_script_entity(ScriptComponent::with_program("tools/foo.lua"));
    shell.select(Some(foreign));
    run_frame(&mut shell);
    assert_eq!(inspector_state(&shell), InspectorState::DelegatingDefault);
    assert!(!shell.scene.is_dirty());
}

#[test]
fn play_mode_requests_constant_repaint() {
    let dir = TempDir::new().expect("temp dir");
    let (mut shell, _) = shell_with_gauge(&dir);

    run_frame(&mut shell);
    assert!(!shell.repaint_requested(), "editing mode draws on demand");

    shell.set_play_state(PlayState::Playing);
    run_frame(&mut shell);
    assert!(shell.repaint_requested(), "play mode must repaint every frame");
}

#[test]
fn deselecting_tears_down_the_inspector_and_its_proxy() {
    let dir = TempDir::new().expect("temp dir");
    let (mut shell, _) = shell_with_gauge(&dir);
    run_frame(&mut shell);
    assert_eq!(shell.bridge.proxy_count(), 1);

    shell.select(None);
    assert!(shell.active_editor().is_none());
    assert_eq!(shell.bridge.proxy_count(), 0, "deselection destroys the editing proxy");
}

#[test]
fn reload_that_removes_the_lifecycle_demotes_to_fallback() {
    let dir = TempDir::new().expect("temp dir");
    let (mut shell, entity) = shell_with_gauge(&dir);
    run_frame(&mut shell);
    assert_eq!(inspector_state(&shell), InspectorState::DelegatingCustom("gauge".to_string()));

    std::thread::sleep(std::time::Duration::from_millis(1100));
    let path = dir.path().join("gauge.rhai");
    fs::write(&path, "fn helper() { 1 }\n").expect("rewrite script");

    run_frame(&mut shell);
    assert_eq!(inspector_state(&shell), InspectorState::FallbackGeneric);
    assert_eq!(
        shell.bridge.proxy_count(),
        0,
        "eligibility loss changed the resolved behaviour; the proxy must be destroyed"
    );
    assert!(shell.bridge.proxy(entity).is_none());
}

#[test]
fn losing_the_program_releases_the_proxy() {
    let dir = TempDir::new().expect("temp dir");
    let (mut shell, entity) = shell_with_gauge(&dir);
    run_frame(&mut shell);
    assert_eq!(shell.bridge.proxy_count(), 1);

    if let Some(mut component) = shell.scene.world.get_mut::<ScriptComponent>(entity) {
        component.program = None;
    }
    run_frame(&mut shell);
    assert_eq!(inspector_state(&shell), InspectorState::DelegatingDefault);
    assert_eq!(shell.bridge.proxy_count(), 0, "the default path must not keep a stale proxy");
}
