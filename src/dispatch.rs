use anyhow::{bail, Result};
use std::any::TypeId;

use crate::host::{DispatchTable, InspectorBinding};
use crate::inspector::{OverrideInspector, OVERRIDE_EDITOR_NAME};
use crate::registry::RegistryHandle;
use crate::scene::ScriptComponent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstallState {
    NotInstalled,
    Installed,
    Failed,
}

/// Replaces the host's built-in binding for `ScriptComponent` with the
/// override inspector. Safe to call repeatedly (domain reloads); leaves
/// every other component type's bindings alone.
pub struct DispatchOverride {
    state: InstallState,
}

impl Default for DispatchOverride {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchOverride {
    pub fn new() -> Self {
        Self { state: InstallState::NotInstalled }
    }

    pub fn is_installed(&self) -> bool {
        self.state == InstallState::Installed
    }

    pub fn install(&mut self, table: &mut DispatchTable, registry: RegistryHandle) -> Result<()> {
        if self.state == InstallState::Failed {
            bail!("inspector dispatch override is disabled after an earlier installation failure");
        }

        let component = TypeId::of::<ScriptComponent>();
        let bindings = table.bindings_for(component);

        if bindings.iter().any(|binding| binding.editor_name == OVERRIDE_EDITOR_NAME) {
            // Already routed through the override; nothing to patch again.
            self.state = InstallState::Installed;
            return Ok(());
        }

        // The host must have seeded its own binding slot for the component
        // type. Anything else means the dispatch structures are not in the
        // shape this override was written against, and a partial patch would
        // leave the editor silently broken.
        if bindings.is_empty() {
            self.state = InstallState::Failed;
            eprintln!(
                "[inspector] dispatch table has no binding slot for ScriptComponent; \
                 the inspector override cannot be installed and stays inert"
            );
            bail!("dispatch table missing the built-in ScriptComponent binding");
        }

        table.remove_bindings(component);
        table.add_binding(
            component,
            InspectorBinding::new(OVERRIDE_EDITOR_NAME, false, move || {
                Box::new(OverrideInspector::new(registry.clone()))
            }),
        );
        self.state = InstallState::Installed;
        Ok(())
    }
}
