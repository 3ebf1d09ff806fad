use egui::Ui;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use crate::host::PlayState;
use crate::proxy::ProxyInstance;

pub struct InspectorContext<'a> {
    pub play_state: PlayState,
    pub compile_error: Option<&'a str>,
}

/// A user-supplied custom inspector. It binds to the editing proxy, never to
/// the backing component; the bridge pushes its edits back after each draw.
pub trait BehaviourInspector {
    /// Called before each draw so the inspector can pick up out-of-band
    /// changes (undo, scene reload) from the proxy's current field state.
    fn refresh(&mut self, proxy: &ProxyInstance) {
        let _ = proxy;
    }

    fn edit(&mut self, ui: &mut Ui, proxy: &mut ProxyInstance, ctx: &mut InspectorContext<'_>);
}

pub type BehaviourInspectorFactory = fn() -> Box<dyn BehaviourInspector>;

/// One "custom inspector for behaviour T" declaration, listed by an
/// inspector module at registration time.
pub struct InspectorDeclaration {
    pub behaviour: String,
    pub inspector_name: &'static str,
    pub factory: BehaviourInspectorFactory,
}

pub struct InspectorModule {
    pub name: &'static str,
    pub declarations: Vec<InspectorDeclaration>,
}

pub struct EditorBinding {
    pub behaviour: String,
    pub inspector_name: &'static str,
    factory: BehaviourInspectorFactory,
}

impl EditorBinding {
    pub fn factory(&self) -> BehaviourInspectorFactory {
        self.factory
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedBinding {
    pub behaviour: String,
    pub kept_inspector: &'static str,
    pub rejected_inspector: &'static str,
}

/// Behaviour name → editor binding map. Built once from declarative module
/// lists; rebuilds are explicit, never triggered per draw.
#[derive(Default)]
pub struct InspectorRegistry {
    bindings: HashMap<String, EditorBinding>,
    rejected: Vec<RejectedBinding>,
    built: bool,
}

impl InspectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, modules: &[InspectorModule]) {
        self.reset();
        for module in modules {
            for declaration in &module.declarations {
                if let Some(existing) = self.bindings.get(&declaration.behaviour) {
                    eprintln!(
                        "[inspector] cannot register inspector '{}' for behaviour '{}' since inspector '{}' is already registered (module '{}')",
                        declaration.inspector_name,
                        declaration.behaviour,
                        existing.inspector_name,
                        module.name,
                    );
                    self.rejected.push(RejectedBinding {
                        behaviour: declaration.behaviour.clone(),
                        kept_inspector: existing.inspector_name,
                        rejected_inspector: declaration.inspector_name,
                    });
                    continue;
                }
                self.bindings.insert(
                    declaration.behaviour.clone(),
                    EditorBinding {
                        behaviour: declaration.behaviour.clone(),
                        inspector_name: declaration.inspector_name,
                        factory: declaration.factory,
                    },
                );
            }
        }
        self.built = true;
    }

    pub fn resolve(&self, behaviour: &str) -> Option<&EditorBinding> {
        self.bindings.get(behaviour)
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn rejected(&self) -> &[RejectedBinding] {
        &self.rejected
    }

    pub fn reset(&mut self) {
        self.bindings.clear();
        self.rejected.clear();
        self.built = false;
    }
}

/// Shared read-mostly handle; written during initialization, read-only in
/// steady state. Injected into the override inspector instead of living as
/// ambient global state.
#[derive(Clone, Default)]
pub struct RegistryHandle(Rc<RefCell<InspectorRegistry>>);

impl RegistryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Ref<'_, InspectorRegistry> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, InspectorRegistry> {
        self.0.borrow_mut()
    }
}
