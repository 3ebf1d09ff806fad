use std::any::TypeId;

use script_inspector::dispatch::DispatchOverride;
use script_inspector::host::{DefaultScriptEditor, DispatchTable, InspectorBinding};
use script_inspector::inspector::OVERRIDE_EDITOR_NAME;
use script_inspector::registry::RegistryHandle;
use script_inspector::scene::ScriptComponent;

struct OtherComponent;

fn table_with_unrelated_binding() -> DispatchTable {
    let mut table = DispatchTable::with_builtin_defaults();
    table.add_binding(
        TypeId::of::<OtherComponent>(),
        InspectorBinding::new("OtherEditor", true, || Box::new(DefaultScriptEditor)),
    );
    table
}

#[test]
fn install_twice_leaves_exactly_one_override_binding() {
    let mut table = table_with_unrelated_binding();
    let mut install = DispatchOverride::new();

    install.install(&mut table, RegistryHandle::new()).expect("first install should succeed");
    install.install(&mut table, RegistryHandle::new()).expect("second install should be a no-op");
    assert!(install.is_installed());

    let bindings = table.bindings_for(TypeId::of::<ScriptComponent>());
    assert_eq!(bindings.len(), 1, "expected a single binding after repeated install");
    assert_eq!(bindings[0].editor_name, OVERRIDE_EDITOR_NAME);
    assert!(!bindings[0].builtin, "the built-in binding must have been replaced");
}

#[test]
fn install_does_not_disturb_other_component_bindings() {
    let mut table = table_with_unrelated_binding();
    let mut install = DispatchOverride::new();
    install.install(&mut table, RegistryHandle::new()).expect("install should succeed");

    let other = table.bindings_for(TypeId::of::<OtherComponent>());
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].editor_name, "OtherEditor");
}

#[test]
fn missing_binding_slot_is_fatal_and_leaves_no_partial_patch() {
    let mut table = DispatchTable::empty();
    let mut install = DispatchOverride::new();

    let err = install
        .install(&mut table, RegistryHandle::new())
        .expect_err("install against an unexpected table shape must fail");
    assert!(err.to_string().contains("ScriptComponent"), "diagnostic should name the component");
    assert!(!install.is_installed());
    assert!(table.bindings_for(TypeId::of::<ScriptComponent>()).is_empty());
}

#[test]
fn failed_install_is_not_retried() {
    let mut table = DispatchTable::empty();
    let mut install = DispatchOverride::new();
    let _ = install.install(&mut table, RegistryHandle::new());

    // Even with the host table later brought into shape, the override stays
    // inert for the rest of the process.
    let mut table = DispatchTable::with_builtin_defaults();
    install
        .install(&mut table, RegistryHandle::new())
        .expect_err("override must stay inert after an initialization failure");
    assert_eq!(table.bindings_for(TypeId::of::<ScriptComponent>()).len(), 1);
    assert_ne!(table.bindings_for(TypeId::of::<ScriptComponent>())[0].editor_name, OVERRIDE_EDITOR_NAME);
}
