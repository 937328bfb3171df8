use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{ArchitectError, ArchitectResult};

/// A development launch configuration as the IDE/run tooling sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    pub name: String,
    /// `client` or `server`.
    pub environment: String,
    pub main_class: String,
    /// Space separated, as handed to the JVM.
    pub vm_args: String,
    pub program_args: String,
    pub ide_config_generated: bool,
    pub tasks_before_run: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: "client".into(),
            environment: "client".into(),
            main_class: String::new(),
            vm_args: String::new(),
            program_args: String::new(),
            ide_config_generated: false,
            tasks_before_run: Vec::new(),
        }
    }
}

/// Run configurations stored as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct RunConfigStore {
    dir: PathBuf,
}

impl RunConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn load(&self, name: &str) -> ArchitectResult<RunConfig> {
        let path = self.path_for(name);
        let json = std::fs::read_to_string(&path).map_err(|e| ArchitectError::io(&path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Every readable run configuration, sorted by name. Corrupt files are skipped.
    pub fn list(&self) -> ArchitectResult<Vec<RunConfig>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut configs = Vec::new();
        let entries = std::fs::read_dir(&self.dir).map_err(|e| ArchitectError::io(&self.dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| ArchitectError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<RunConfig>(&json) {
                    Ok(config) => configs.push(config),
                    Err(e) => warn!("Corrupt run config at {:?}: {}", path, e),
                },
                Err(e) => warn!("Cannot read {:?}: {}", path, e),
            }
        }

        configs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(configs)
    }

    pub fn save(&self, config: &RunConfig) -> ArchitectResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ArchitectError::io(&self.dir, e))?;
        let path = self.path_for(&config.name);
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&path, json).map_err(|e| ArchitectError::io(&path, e))?;
        debug!("saved run config {:?}", path);
        Ok(())
    }
}
