use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rhai::{Engine, EvalAltResult, Scope, AST};

use crate::value::FieldValue;

pub const BEHAVIOUR_EXTENSION: &str = "rhai";

/// Lifecycle entry points a script must define (at least one) to count as a
/// behaviour class rather than a plain script file.
const LIFECYCLE_FNS: &[&str] = &["ready", "process", "physics_process"];

pub fn is_behaviour_source(path: &str) -> bool {
    Path::new(path).extension().map_or(false, |ext| ext == BEHAVIOUR_EXTENSION)
}

/// Editor-side view of one behaviour script: the resolved behaviour name,
/// its declared public fields, and any compile diagnostic. Loading never
/// fails hard; a broken script simply carries its error.
pub struct ScriptProgramAsset {
    path: PathBuf,
    behaviour_name: Option<String>,
    fields: BTreeMap<String, FieldValue>,
    compile_error: Option<String>,
    ast: Option<AST>,
    last_modified: Option<SystemTime>,
}

impl ScriptProgramAsset {
    fn load(engine: &Engine, path: &Path) -> Self {
        let mut asset = Self {
            path: path.to_path_buf(),
            behaviour_name: None,
            fields: BTreeMap::new(),
            compile_error: None,
            ast: None,
            last_modified: None,
        };
        asset.compile(engine);
        asset
    }

    fn compile(&mut self, engine: &Engine) {
        self.behaviour_name = None;
        self.fields.clear();
        self.compile_error = None;
        self.ast = None;
        self.last_modified = fs::metadata(&self.path).ok().and_then(|meta| meta.modified().ok());

        let source = match fs::read_to_string(&self.path) {
            Ok(source) => source,
            Err(err) => {
                self.compile_error = Some(format!("Reading {}: {err}", self.path.display()));
                return;
            }
        };
        let ast = match engine.compile(&source) {
            Ok(ast) => ast,
            Err(err) => {
                self.compile_error = Some(err.to_string());
                return;
            }
        };

        let is_behaviour = ast
            .iter_functions()
            .any(|func| LIFECYCLE_FNS.contains(&func.name));
        if is_behaviour {
            self.behaviour_name = self
                .path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
            self.discover_fields(engine, &ast);
        }
        self.ast = Some(ast);
    }

    // Public fields come from the script's `defaults()` map. A missing
    // `defaults` is fine; a failing one is surfaced like a compile error.
    fn discover_fields(&mut self, engine: &Engine, ast: &AST) {
        let mut scope = Scope::new();
        match engine.call_fn::<rhai::Map>(&mut scope, ast, "defaults", ()) {
            Ok(map) => {
                for (name, value) in &map {
                    match FieldValue::from_dynamic(value) {
                        Some(field) => {
                            self.fields.insert(name.to_string(), field);
                        }
                        None => {
                            eprintln!(
                                "[program] {}: ignoring field '{name}' with unsupported default",
                                self.path.display()
                            );
                        }
                    }
                }
            }
            Err(err) => {
                if !matches!(err.as_ref(), EvalAltResult::ErrorFunctionNotFound(..)) {
                    self.compile_error = Some(err.to_string());
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn behaviour_name(&self) -> Option<&str> {
        self.behaviour_name.as_deref()
    }

    pub fn is_behaviour(&self) -> bool {
        self.behaviour_name.is_some()
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn compile_error(&self) -> Option<&str> {
        self.compile_error.as_deref()
    }

    fn source_changed(&self) -> bool {
        let modified = fs::metadata(&self.path).ok().and_then(|meta| meta.modified().ok());
        match (self.last_modified, modified) {
            (Some(prev), Some(now)) => now > prev,
            (None, Some(_)) => true,
            _ => false,
        }
    }
}

/// Path-keyed cache of compiled behaviour programs sharing one rhai engine.
pub struct ProgramRegistry {
    engine: Engine,
    assets: HashMap<String, ScriptProgramAsset>,
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramRegistry {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_fast_operators(true);
        Self { engine, assets: HashMap::new() }
    }

    pub fn get_or_load(&mut self, path: &str) -> &ScriptProgramAsset {
        self.assets
            .entry(path.to_string())
            .or_insert_with(|| ScriptProgramAsset::load(&self.engine, Path::new(path)))
    }

    pub fn get(&self, path: &str) -> Option<&ScriptProgramAsset> {
        self.assets.get(path)
    }

    /// Recompiles the asset when the file on disk is newer than the cached
    /// copy. Returns true when a recompile happened, so callers can invalidate
    /// proxies typed to the old behaviour.
    pub fn reload_if_changed(&mut self, path: &str) -> bool {
        match self.assets.get_mut(path) {
            Some(asset) if asset.source_changed() => {
                asset.compile(&self.engine);
                true
            }
            Some(_) => false,
            None => {
                self.get_or_load(path);
                true
            }
        }
    }

    pub fn force_reload(&mut self, path: &str) {
        let asset = self
            .assets
            .entry(path.to_string())
            .or_insert_with(|| ScriptProgramAsset::load(&self.engine, Path::new(path)));
        asset.compile(&self.engine);
    }
}
