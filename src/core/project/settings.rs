use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::maven::{ARCHITECTURY_MAVEN, FABRIC_MAVEN, MAVEN_CENTRAL};
use crate::core::platform::Platform;
use crate::core::toolchain::ToolchainSettings;

/// Settings file looked up in the project directory.
pub const SETTINGS_FILE: &str = "architectury.json";

/// Per-project configuration, the equivalent of the build-script extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchitecturySettings {
    pub transformer_version: String,
    pub injectables_version: String,
    pub minecraft: String,
    pub inject_injectables: bool,
    pub add_common_marker: bool,

    /// Project name; defaults to the project directory name.
    pub project_name: Option<String>,
    /// Root project directory, relative to the project. `None` means the
    /// project is its own root.
    pub root_project: Option<PathBuf>,
    pub archives_base_name: Option<String>,
    pub version: String,

    /// Local Maven-layout repositories searched in order.
    pub local_repositories: Vec<PathBuf>,
    /// Remote repositories used by `fetch`.
    pub repositories: Vec<String>,
    /// File-based configuration contents, e.g. `compileClasspath` or
    /// `developmentFabric`. Relative paths are project-relative.
    pub configurations: BTreeMap<String, Vec<PathBuf>>,

    /// Platforms registered by `prepare` when none are given on the command line.
    pub platforms: Vec<Platform>,
    /// Extra transformer classes appended after a platform's built-in steps.
    pub extra_steps: BTreeMap<Platform, Vec<String>>,

    pub toolchain: Option<ToolchainSettings>,
    /// Directory holding run configurations (`*.json`).
    pub runs_dir: PathBuf,
    pub common: CommonSettings,
}

/// Options for the `common` packaging entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonSettings {
    pub forge_enabled: bool,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            forge_enabled: true,
        }
    }
}

impl Default for ArchitecturySettings {
    fn default() -> Self {
        Self {
            transformer_version: "4.0.49".into(),
            injectables_version: "1.0.10".into(),
            minecraft: String::new(),
            inject_injectables: true,
            add_common_marker: true,
            project_name: None,
            root_project: None,
            archives_base_name: None,
            version: "1.0.0".into(),
            local_repositories: Vec::new(),
            repositories: vec![
                ARCHITECTURY_MAVEN.to_string(),
                FABRIC_MAVEN.to_string(),
                MAVEN_CENTRAL.to_string(),
            ],
            configurations: BTreeMap::new(),
            platforms: Vec::new(),
            extra_steps: BTreeMap::new(),
            toolchain: None,
            runs_dir: PathBuf::from("runs"),
            common: CommonSettings::default(),
        }
    }
}

impl ArchitecturySettings {
    /// Load `architectury.json` from `project_dir`, or defaults when absent.
    pub fn load_or_default(project_dir: &Path) -> ArchitectResult<Self> {
        let path = project_dir.join(SETTINGS_FILE);
        if !path.exists() {
            debug!("no settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| ArchitectError::io(&path, e))?;
        let settings = serde_json::from_str(&raw)?;
        debug!("loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn save(&self, project_dir: &Path) -> ArchitectResult<()> {
        let path = project_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| ArchitectError::io(&path, e))
    }

    pub fn transformer_coordinate(&self, classifier: &str) -> String {
        format!(
            "dev.architectury:architectury-transformer:{}:{}",
            self.transformer_version, classifier
        )
    }

    pub fn injectables_coordinate(&self) -> String {
        format!(
            "dev.architectury:architectury-injectables:{}",
            self.injectables_version
        )
    }
}
