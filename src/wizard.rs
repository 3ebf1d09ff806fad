use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::StudioConfig;
use crate::program::BEHAVIOUR_EXTENSION;

const DEFAULT_TEMPLATE: &str = r#"// {name}

fn defaults() {
    #{}
}

fn ready(world, entity) {
}

fn process(world, entity, dt) {
}
"#;

pub fn sanitize_script_name(name: &str) -> String {
    name.replace(' ', "")
        .replace('#', "Sharp")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Creates a new behaviour script from the configured template and returns
/// its path. Refuses to clobber an existing file unless asked to.
pub fn create_behaviour_script(
    dir: impl AsRef<Path>,
    name: &str,
    config: &StudioConfig,
    overwrite: bool,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let sanitized = sanitize_script_name(name);
    if sanitized.is_empty() {
        bail!("script name '{name}' contains no usable characters");
    }

    let path = dir.join(format!("{sanitized}.{BEHAVIOUR_EXTENSION}"));
    if path.exists() && !overwrite {
        bail!("script file '{}' already exists", path.display());
    }

    let template = match &config.script.template_path {
        Some(template_path) => fs::read_to_string(template_path)
            .with_context(|| format!("Reading script template {template_path}"))?,
        None => DEFAULT_TEMPLATE.to_string(),
    };
    let contents = template.replace("{name}", &sanitized);

    fs::create_dir_all(dir).with_context(|| format!("Creating script directory {}", dir.display()))?;
    fs::write(&path, contents).with_context(|| format!("Writing script {}", path.display()))?;
    Ok(path)
}
