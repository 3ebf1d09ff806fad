use bevy_ecs::prelude::{Entity, World};
use std::collections::{BTreeMap, HashMap};

use crate::scene::ScriptComponent;
use crate::value::FieldValue;

/// Transient, never-serialized stand-in a custom inspector edits instead of
/// the backing component. Field set is fixed to the behaviour's declared
/// public variables at creation time; `defaults` keeps that seed so untouched
/// defaults can be told apart from edits.
pub struct ProxyInstance {
    pub behaviour: String,
    pub backing: Entity,
    pub fields: BTreeMap<String, FieldValue>,
    pub defaults: BTreeMap<String, FieldValue>,
    pub enabled: bool,
}

impl ProxyInstance {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn remove_field(&mut self, name: &str) {
        self.fields.remove(name);
    }
}

/// Keeps at most one live proxy per backing entity and copies field state
/// between the two representations.
#[derive(Default)]
pub struct ProxyBridge {
    proxies: HashMap<Entity, ProxyInstance>,
}

impl ProxyBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses the proxy while the resolved behaviour is unchanged; a changed
    /// behaviour destroys the stale proxy and seeds a fresh one from the
    /// declared defaults overlaid with the backing component's saved values.
    pub fn get_or_create(
        &mut self,
        entity: Entity,
        behaviour: &str,
        declared_fields: &BTreeMap<String, FieldValue>,
        backing: &ScriptComponent,
    ) -> &mut ProxyInstance {
        let stale = self
            .proxies
            .get(&entity)
            .map_or(true, |proxy| proxy.behaviour != behaviour);
        if stale {
            let mut proxy = ProxyInstance {
                behaviour: behaviour.to_string(),
                backing: entity,
                fields: declared_fields.clone(),
                defaults: declared_fields.clone(),
                enabled: true,
            };
            copy_backing_to_proxy(&mut proxy, backing);
            self.proxies.insert(entity, proxy);
        }
        self.proxies.get_mut(&entity).expect("proxy inserted above")
    }

    pub fn proxy(&self, entity: Entity) -> Option<&ProxyInstance> {
        self.proxies.get(&entity)
    }

    pub fn proxy_mut(&mut self, entity: Entity) -> Option<&mut ProxyInstance> {
        self.proxies.get_mut(&entity)
    }

    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.proxies.remove(&entity).is_some()
    }

    pub fn destroy_all(&mut self) {
        self.proxies.clear();
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    /// Write path: pushes the proxy's fields onto the backing component in
    /// the world. Returns false when nothing observable changed, in which
    /// case callers must not dirty-mark anything.
    pub fn sync_to_backing(&self, entity: Entity, world: &mut World) -> bool {
        let Some(proxy) = self.proxies.get(&entity) else {
            return false;
        };
        let Some(mut backing) = world.get_mut::<ScriptComponent>(proxy.backing) else {
            return false;
        };
        copy_proxy_to_backer(proxy, &mut backing)
    }
}

/// Field-by-field read path, restricted to fields the proxy declares.
/// Host-side values with no proxy counterpart are ignored.
pub fn copy_backing_to_proxy(proxy: &mut ProxyInstance, backing: &ScriptComponent) {
    for (name, value) in &backing.values {
        if proxy.fields.contains_key(name) {
            proxy.fields.insert(name.clone(), value.clone());
        }
    }
}

/// Inverse copy; reference-valued fields keep identity because only the id
/// travels. Backing values the proxy does not declare stay untouched, and an
/// unsaved field still sitting on its declared default is not an edit, so it
/// is never written out.
pub fn copy_proxy_to_backer(proxy: &ProxyInstance, backing: &mut ScriptComponent) -> bool {
    let mut changed = false;
    for (name, value) in &proxy.fields {
        if backing.values.get(name) == Some(value) {
            continue;
        }
        if !backing.values.contains_key(name) && proxy.defaults.get(name) == Some(value) {
            continue;
        }
        backing.values.insert(name.clone(), value.clone());
        changed = true;
    }
    changed
}
