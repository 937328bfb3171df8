use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::process::ExternalTransformer;
use crate::core::archive::{create_empty_jar, with_jar, ArchiveOutput};
use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::platform::{
    add_injectables_classpath, ensure_transformer_classpath, Platform, TransformRegistration,
};
use crate::core::project::{
    ArchitecturySettings, BuildEngine, CommonSettings, Dependency, TaskAction, BUILD_TASK,
    COMPILE_ONLY, JAR_TASK, REMAP_JAR_TASK,
};
use crate::core::runtime::{RuntimeProperties, REFMAP_NAME};
use crate::core::transformers::AddRefmapName;

/// Zero-byte entry flagging a jar as loader-agnostic.
pub const COMMON_MARKER: &str = "architectury.common.marker";

/// Outcome of [`ProductionPackager::setup_common`].
#[derive(Debug, Clone, Default)]
pub struct CommonSetup {
    /// `transformProduction<Platform>` tasks, in configuration order.
    pub production_tasks: Vec<String>,
    /// Placeholder jars created because no output existed yet.
    pub placeholders: Vec<PathBuf>,
    /// The toolchain must generate SRG tiny mappings.
    pub generate_srg_tiny: bool,
}

pub struct ProductionPackager<'a> {
    settings: &'a ArchitecturySettings,
}

impl<'a> ProductionPackager<'a> {
    pub fn new(settings: &'a ArchitecturySettings) -> Self {
        Self { settings }
    }

    /// Configure the common project: injectables, production configurations,
    /// archive tasks and placeholder outputs.
    pub fn setup_common(
        &self,
        engine: &mut dyn BuildEngine,
        common: &CommonSettings,
    ) -> ArchitectResult<CommonSetup> {
        if self.settings.inject_injectables {
            let created = ensure_transformer_classpath(engine)?;
            engine.add_dependency(
                COMPILE_ONLY,
                Dependency::module(&self.settings.injectables_coordinate())?,
            )?;
            if created {
                add_injectables_classpath(engine, self.settings)?;
            }
        }

        let platforms: &[Platform] = if common.forge_enabled {
            &[Platform::Fabric, Platform::Forge]
        } else {
            &[Platform::Fabric]
        };
        for platform in platforms.iter().rev() {
            engine.create_configuration(&platform.production_name())?;
        }

        engine.task_mut(JAR_TASK).archive_classifier = Some("dev".into());

        let mut setup = CommonSetup::default();
        for platform in platforms {
            let name = platform.production_name();
            let task = engine.task_mut(&name);
            task.archive_classifier = Some(name.clone());
            task.input_from = Some(JAR_TASK.into());
            task.depends_on.insert(JAR_TASK.into());
            engine.add_artifact(&name, &name)?;
            engine.task_mut(BUILD_TASK).depends_on.insert(name.clone());
            setup.production_tasks.push(name);
        }

        self.configure_remap_jar(engine);

        for name in setup.production_tasks.iter().rev() {
            let output = engine
                .archive_file(name)
                .ok_or_else(|| ArchitectError::Other(format!("task {} has no archive", name)))?;
            if !output.exists() {
                create_empty_jar(&output)?;
                setup.placeholders.push(output);
            }
        }

        setup.generate_srg_tiny = common.forge_enabled;
        info!(
            "configured common packaging for {}",
            setup.production_tasks.join(", ")
        );
        Ok(setup)
    }

    /// `remapJar` reads the dev jar and marks its output as common.
    pub fn configure_remap_jar(&self, engine: &mut dyn BuildEngine) {
        let remap = engine.task_mut(REMAP_JAR_TASK);
        remap.archive_classifier = Some(String::new());
        remap.input_from = Some(JAR_TASK.into());
        remap.depends_on.insert(JAR_TASK.into());
        if !remap.do_last.contains(&TaskAction::AddCommonMarker) {
            remap.do_last.push(TaskAction::AddCommonMarker);
        }
    }

    /// Run the post-actions registered on `task`.
    ///
    /// Returns whether every action took effect. Actions that fail or are
    /// disabled are logged and do not stop the rest.
    pub fn run_task_actions(&self, engine: &dyn BuildEngine, task: &str) -> ArchitectResult<bool> {
        let archive = engine
            .archive_file(task)
            .ok_or_else(|| ArchitectError::Other(format!("task {} has no archive", task)))?;

        let mut all_applied = true;
        for action in task_actions(engine, task) {
            let applied = match action {
                TaskAction::AddCommonMarker => self.add_common_marker(&archive),
            };
            all_applied &= applied;
        }
        Ok(all_applied)
    }

    /// Add the common marker to `archive`. Failures are logged, never raised.
    pub fn add_common_marker(&self, archive: &Path) -> bool {
        if !self.settings.add_common_marker {
            debug!("common marker disabled");
            return false;
        }
        match with_jar(archive, |jar| jar.add_file(COMMON_MARKER, Vec::new())) {
            Ok(()) => {
                info!("added {} to {:?}", COMMON_MARKER, archive);
                true
            }
            Err(e) => {
                warn!("Failed to add {} to {:?}: {}", COMMON_MARKER, archive, e);
                false
            }
        }
    }

    /// Transform `input` into `output` for one platform, then name the refmap
    /// in the resulting mixin configs.
    ///
    /// Returns the mixin configs the refmap pass rewrote.
    pub fn transform_production(
        &self,
        registration: &TransformRegistration,
        input: &Path,
        output: &Path,
        transformer: &dyn ExternalTransformer,
        properties: &RuntimeProperties,
    ) -> ArchitectResult<Vec<String>> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ArchitectError::io(parent, e))?;
        }
        transformer.transform(input, output, registration.steps(), properties)?;

        let Some(refmap_name) = properties.get(REFMAP_NAME) else {
            debug!("no refmap name known, leaving mixin configs as produced");
            return Ok(Vec::new());
        };
        let pass = AddRefmapName::new(refmap_name);
        let rewritten = with_jar(output, |jar| pass.apply(jar))?;
        info!(
            "{} production jar ready at {:?}",
            registration.platform(),
            output
        );
        Ok(rewritten)
    }
}

fn task_actions(engine: &dyn BuildEngine, task: &str) -> Vec<TaskAction> {
    engine.task(task).map(|t| t.do_last.clone()).unwrap_or_default()
}
