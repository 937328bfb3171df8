use std::path::Path;

use tracing::{debug, info};

use super::classpath::safe_path_str;
use super::run_config::RunConfig;
use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::platform::TransformPlan;
use crate::core::project::GeneratedArtifactFiles;

/// Main class that bootstraps the runtime transformer before the game.
pub const TRANSFORMER_RUNTIME_MAIN: &str = "dev.architectury.transformer.TransformerRuntime";

/// Wrap `value` in double quotes if it contains any whitespace.
pub fn escape_spaces(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

/// Points development run configurations at the runtime transformer.
pub struct LaunchConfigPatcher<'a> {
    plan: &'a TransformPlan,
    files: &'a GeneratedArtifactFiles,
}

impl<'a> LaunchConfigPatcher<'a> {
    pub fn new(plan: &'a TransformPlan, files: &'a GeneratedArtifactFiles) -> Self {
        Self { plan, files }
    }

    /// Returns whether `config` was modified.
    pub fn patch(&self, config: &mut RunConfig) -> ArchitectResult<bool> {
        if self.plan.is_empty() {
            return Ok(false);
        }
        if config.main_class == TRANSFORMER_RUNTIME_MAIN {
            debug!("run config '{}' already launches through the transformer", config.name);
            return Ok(false);
        }

        let agent = self.plan.agent().ok_or_else(|| ArchitectError::IllegalAgentCount {
            agents: Vec::new(),
        })?;

        write_file(&self.files.main_class, config.main_class.as_bytes())?;
        config.main_class = TRANSFORMER_RUNTIME_MAIN.to_string();

        self.push_property(config, "architectury.main.class", &self.files.main_class);
        self.push_property(config, "architectury.runtime.transformer", &self.files.transforms);
        self.push_property(config, "architectury.properties", &self.files.properties);
        config.vm_args.push_str(" -Djdk.attach.allowAttachSelf=true");

        refresh_agent_cache(agent, &self.files.agent)?;
        config.vm_args.push_str(&format!(
            " -javaagent:{}",
            escape_spaces(&safe_path_str(&self.files.agent))
        ));

        info!("patched run config '{}'", config.name);
        Ok(true)
    }

    fn push_property(&self, config: &mut RunConfig, key: &str, path: &Path) {
        config.vm_args.push_str(&format!(
            " -D{}={}",
            key,
            escape_spaces(&safe_path_str(path))
        ));
    }
}

/// Flag every run configuration for IDE generation and build the project's
/// classes before each run.
pub fn setup_ide_runs(project_name: &str, configs: &mut [RunConfig]) {
    let task = format!("$PROJECT_DIR$/{}:classes", project_name);
    for config in configs {
        config.ide_config_generated = true;
        if !config.tasks_before_run.contains(&task) {
            config.tasks_before_run.push(task.clone());
        }
    }
}

fn refresh_agent_cache(agent: &Path, cache: &Path) -> ArchitectResult<()> {
    if cache.exists() {
        std::fs::remove_file(cache).map_err(|e| ArchitectError::io(cache, e))?;
    }
    std::fs::copy(agent, cache).map_err(|e| ArchitectError::io(agent, e))?;
    debug!("copied agent {:?} -> {:?}", agent, cache);
    Ok(())
}

fn write_file(path: &Path, content: &[u8]) -> ArchitectResult<()> {
    std::fs::write(path, content).map_err(|e| ArchitectError::io(path, e))
}
