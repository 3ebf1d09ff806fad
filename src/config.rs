use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    #[serde(default)]
    pub template_path: Option<String>,
    #[serde(default = "ScriptConfig::default_script_dir")]
    pub script_dir: String,
}

impl ScriptConfig {
    fn default_script_dir() -> String {
        "assets/scripts".to_string()
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self { template_path: None, script_dir: Self::default_script_dir() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "ConsoleConfig::default_capacity")]
    pub capacity: usize,
}

impl ConsoleConfig {
    const fn default_capacity() -> usize {
        64
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { capacity: Self::default_capacity() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl StudioConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }
}
