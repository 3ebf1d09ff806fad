use anyhow::{Context, Result};
use bevy_ecs::prelude::{Component, Entity, World};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::value::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    None,
    Continuous,
    Manual,
}

impl SyncMode {
    pub fn label(self) -> &'static str {
        match self {
            SyncMode::None => "None",
            SyncMode::Continuous => "Continuous",
            SyncMode::Manual => "Manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub mode: SyncMode,
    #[serde(default)]
    pub sync_position: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractSettings {
    #[serde(default = "InteractSettings::default_text")]
    pub text: String,
    #[serde(default = "InteractSettings::default_proximity")]
    pub proximity: f32,
}

impl InteractSettings {
    fn default_text() -> String {
        "Use".to_string()
    }

    const fn default_proximity() -> f32 {
        2.0
    }
}

impl Default for InteractSettings {
    fn default() -> Self {
        Self { text: Self::default_text(), proximity: Self::default_proximity() }
    }
}

/// The backing runtime component: the object the host serializes and
/// executes. This subsystem only reads and writes its fields; lifetime is
/// owned by the scene.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptComponent {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub interact: InteractSettings,
}

fn default_enabled() -> bool {
    true
}

impl Default for ScriptComponent {
    fn default() -> Self {
        Self {
            program: None,
            enabled: true,
            values: BTreeMap::new(),
            sync: SyncSettings::default(),
            interact: InteractSettings::default(),
        }
    }
}

impl ScriptComponent {
    pub fn with_program(path: impl Into<String>) -> Self {
        Self { program: Some(path.into()), ..Self::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneData {
    #[serde(default)]
    pub entities: Vec<SceneEntityData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptComponent>,
}

/// One persisted unit: the world of backing components plus its dirty flag.
/// Proxies are not components, so a scene export can never contain them.
pub struct EditorScene {
    pub world: World,
    dirty: bool,
}

impl Default for EditorScene {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorScene {
    pub fn new() -> Self {
        Self { world: World::new(), dirty: false }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn spawn_script_entity(&mut self, component: ScriptComponent) -> Entity {
        self.world.spawn(component).id()
    }

    pub fn export(&mut self) -> SceneData {
        let mut entities = Vec::new();
        let mut query = self.world.query::<&ScriptComponent>();
        for script in query.iter(&self.world) {
            entities.push(SceneEntityData { script: Some(script.clone()) });
        }
        SceneData { entities }
    }

    pub fn import(&mut self, data: &SceneData) {
        for entity in &data.entities {
            if let Some(script) = &entity.script {
                self.world.spawn(script.clone());
            }
        }
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.export();
        let json = serde_json::to_string_pretty(&data)
            .with_context(|| format!("Serializing scene for {}", path.display()))?;
        fs::write(path, json).with_context(|| format!("Writing scene {}", path.display()))?;
        self.dirty = false;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).with_context(|| format!("Reading scene {}", path.display()))?;
        let data: SceneData = serde_json::from_str(&contents)
            .with_context(|| format!("Parsing scene {}", path.display()))?;
        let mut scene = Self::new();
        scene.import(&data);
        Ok(scene)
    }
}
