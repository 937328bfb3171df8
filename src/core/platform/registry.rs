use std::path::PathBuf;

use tracing::{debug, info};

use super::step::TransformStep;
use super::Platform;
use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::project::{
    ArchitecturySettings, BuildEngine, Dependency, COMPILE_CLASSPATH, JAVA_AGENTS, RUNTIME_ONLY,
    TRANSFORMER_CLASSPATH,
};

/// One platform's configuration name and ordered step list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRegistration {
    platform: Platform,
    configuration_name: String,
    steps: Vec<TransformStep>,
}

impl TransformRegistration {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            configuration_name: platform.development_configuration(),
            steps: Vec::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn configuration_name(&self) -> &str {
        &self.configuration_name
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// Append `step` unless it is already present.
    pub fn add(&mut self, step: TransformStep) -> &mut Self {
        if !self.steps.contains(&step) {
            self.steps.push(step);
        }
        self
    }

    pub fn setup_fabric_steps(&mut self) {
        self.extend_builtin(Platform::Fabric);
    }

    pub fn setup_forge_steps(&mut self) {
        self.extend_builtin(Platform::Forge);
    }

    fn extend_builtin(&mut self, platform: Platform) {
        for step in platform.builtin_steps() {
            self.add(step.clone());
        }
    }
}

/// Collects platform registrations during configuration.
///
/// Consumed by [`freeze`](Self::freeze); nothing downstream ever sees a
/// plan that can still change.
#[derive(Debug)]
pub struct TransformPlanBuilder {
    settings: ArchitecturySettings,
    registrations: Vec<TransformRegistration>,
    agent: Option<PathBuf>,
}

impl TransformPlanBuilder {
    pub fn new(settings: ArchitecturySettings) -> Self {
        Self {
            settings,
            registrations: Vec::new(),
            agent: None,
        }
    }

    pub fn fabric<F>(
        &mut self,
        engine: &mut dyn BuildEngine,
        customize: F,
    ) -> ArchitectResult<&TransformRegistration>
    where
        F: FnOnce(&mut TransformRegistration),
    {
        self.register(engine, Platform::Fabric, customize)
    }

    pub fn forge<F>(
        &mut self,
        engine: &mut dyn BuildEngine,
        customize: F,
    ) -> ArchitectResult<&TransformRegistration>
    where
        F: FnOnce(&mut TransformRegistration),
    {
        self.register(engine, Platform::Forge, customize)
    }

    /// Get-or-create the registration for `platform`.
    ///
    /// Only the first call for a platform creates its configuration and
    /// appends the built-in steps; only the first call overall wires the
    /// runtime transformer into the engine. `customize` runs every time.
    pub fn register<F>(
        &mut self,
        engine: &mut dyn BuildEngine,
        platform: Platform,
        customize: F,
    ) -> ArchitectResult<&TransformRegistration>
    where
        F: FnOnce(&mut TransformRegistration),
    {
        let index = match self
            .registrations
            .iter()
            .position(|r| r.platform == platform)
        {
            Some(index) => {
                debug!("{} already registered, applying customization only", platform);
                index
            }
            None => {
                let mut registration = TransformRegistration::new(platform);
                if !engine.has_configuration(registration.configuration_name()) {
                    engine.create_configuration(registration.configuration_name())?;
                }
                registration.extend_builtin(platform);

                if self.agent.is_none() {
                    self.agent = Some(self.wire_runtime(engine)?);
                }

                info!(
                    "registered {} with {} transform step(s)",
                    platform,
                    registration.steps.len()
                );
                self.registrations.push(registration);
                self.registrations.len() - 1
            }
        };

        let registration = &mut self.registrations[index];
        customize(registration);
        Ok(registration)
    }

    /// Adds the transformer runtime, agent and injectables to the engine and
    /// resolves the single agent artifact.
    fn wire_runtime(&self, engine: &mut dyn BuildEngine) -> ArchitectResult<PathBuf> {
        let created_classpath = ensure_transformer_classpath(engine)?;

        if !engine.has_configuration(JAVA_AGENTS) {
            engine.create_configuration(JAVA_AGENTS)?;
        }
        engine.extend_configuration(RUNTIME_ONLY, JAVA_AGENTS)?;

        engine.add_dependency(
            RUNTIME_ONLY,
            Dependency::module(&self.settings.transformer_coordinate("runtime"))?,
        )?;
        engine.add_dependency(
            JAVA_AGENTS,
            Dependency::module(&self.settings.transformer_coordinate("agent"))?,
        )?;
        if created_classpath && self.settings.inject_injectables {
            add_injectables_classpath(engine, &self.settings)?;
        }

        let mut agents = engine.resolve(JAVA_AGENTS)?;
        if agents.len() != 1 {
            return Err(ArchitectError::IllegalAgentCount { agents });
        }
        Ok(agents.remove(0))
    }

    /// Finish configuration.
    pub fn freeze(self) -> TransformPlan {
        TransformPlan {
            registrations: self.registrations,
            agent: self.agent,
        }
    }
}

/// Create `architecturyTransformerClasspath` extending `compileClasspath`
/// unless the build already declares it. Returns whether it was created.
pub(crate) fn ensure_transformer_classpath(engine: &mut dyn BuildEngine) -> ArchitectResult<bool> {
    if engine.has_configuration(TRANSFORMER_CLASSPATH) {
        return Ok(false);
    }
    engine.create_configuration(TRANSFORMER_CLASSPATH)?;
    engine.extend_configuration(TRANSFORMER_CLASSPATH, COMPILE_CLASSPATH)?;
    Ok(true)
}

pub(crate) fn add_injectables_classpath(
    engine: &mut dyn BuildEngine,
    settings: &ArchitecturySettings,
) -> ArchitectResult<()> {
    engine.add_dependency(
        TRANSFORMER_CLASSPATH,
        Dependency::module(&settings.injectables_coordinate())?,
    )?;
    engine.add_dependency(
        TRANSFORMER_CLASSPATH,
        Dependency::module("net.fabricmc:fabric-loader:+")?,
    )
}

/// Frozen result of configuration: registrations in registration order and
/// the agent resolved for them.
#[derive(Debug, Clone, Default)]
pub struct TransformPlan {
    registrations: Vec<TransformRegistration>,
    agent: Option<PathBuf>,
}

impl TransformPlan {
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn registrations(&self) -> &[TransformRegistration] {
        &self.registrations
    }

    /// The first registered platform.
    pub fn primary(&self) -> Option<&TransformRegistration> {
        self.registrations.first()
    }

    /// Present exactly when at least one platform is registered.
    pub fn agent(&self) -> Option<&PathBuf> {
        self.agent.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::maven::{LocalRepository, MavenArtifact};
    use crate::core::project::ProjectGraph;
    use std::path::Path;

    fn publish(repo: &Path, coord: &str) -> PathBuf {
        let artifact = MavenArtifact::parse(coord).unwrap();
        let path = repo.join(artifact.local_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, coord.as_bytes()).unwrap();
        path
    }

    fn engine(dir: &Path) -> ProjectGraph {
        let repo = dir.join("repo");
        publish(&repo, "dev.architectury:architectury-transformer:4.0.49:agent");
        ProjectGraph::new(
            dir.to_path_buf(),
            "examplemod".into(),
            "1.0.0".into(),
            LocalRepository::new(vec![repo]),
        )
    }

    fn builder() -> TransformPlanBuilder {
        TransformPlanBuilder::new(ArchitecturySettings::default())
    }

    #[test]
    fn registering_twice_keeps_a_single_step_list() {
        for platform in Platform::ALL {
            let dir = tempfile::tempdir().unwrap();
            let mut graph = engine(dir.path());
            let mut builder = builder();

            let first = builder
                .register(&mut graph, platform, |_| {})
                .unwrap()
                .steps()
                .to_vec();
            let second = builder
                .register(&mut graph, platform, |_| {})
                .unwrap()
                .steps()
                .to_vec();

            assert_eq!(first, second);
            assert_eq!(first.as_slice(), platform.builtin_steps());
            assert_eq!(builder.freeze().registrations().len(), 1);
        }
    }

    #[test]
    fn fabric_steps_are_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = engine(dir.path());
        let mut builder = builder();
        let steps = builder.fabric(&mut graph, |_| {}).unwrap().steps().to_vec();

        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0], TransformStep::RuntimeMixinRefmapDetector);
        assert_eq!(steps[1], TransformStep::GenerateFakeFabricMod);
        let refmap = steps
            .iter()
            .position(|s| *s == TransformStep::RuntimeMixinRefmapDetector);
        let expect = steps
            .iter()
            .position(|s| *s == TransformStep::TransformExpectPlatform);
        assert!(refmap < expect);
    }

    #[test]
    fn forge_steps_end_with_mixin_fix() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = engine(dir.path());
        let mut builder = builder();
        let steps = builder.forge(&mut graph, |_| {}).unwrap().steps().to_vec();

        assert_eq!(steps.len(), 8);
        assert_eq!(steps.last(), Some(&TransformStep::FixForgeMixin));
    }

    #[test]
    fn customization_runs_on_every_call_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = engine(dir.path());
        let mut builder = builder();
        let custom = TransformStep::Custom("com.example.StripDebug".into());

        builder
            .fabric(&mut graph, |r| {
                r.add(custom.clone());
            })
            .unwrap();
        let steps = builder
            .fabric(&mut graph, |r| {
                r.add(custom.clone()).add(TransformStep::RemapInjectables);
            })
            .unwrap()
            .steps()
            .to_vec();

        assert_eq!(steps.len(), 6);
        assert_eq!(steps.last(), Some(&custom));
    }

    #[test]
    fn runtime_is_wired_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = engine(dir.path());
        let mut builder = builder();

        builder.fabric(&mut graph, |_| {}).unwrap();
        builder.forge(&mut graph, |_| {}).unwrap();

        assert_eq!(graph.dependencies(JAVA_AGENTS).unwrap().len(), 1);
        assert_eq!(graph.dependencies(RUNTIME_ONLY).unwrap().len(), 1);
        // Injectables and the fabric loader.
        assert_eq!(graph.dependencies(TRANSFORMER_CLASSPATH).unwrap().len(), 2);
        assert!(graph.has_configuration("developmentFabric"));
        assert!(graph.has_configuration("developmentForge"));

        let plan = builder.freeze();
        assert_eq!(plan.primary().unwrap().platform(), Platform::Fabric);
        assert_eq!(
            plan.agent().unwrap(),
            &dir.path()
                .join("repo/dev/architectury/architectury-transformer/4.0.49/architectury-transformer-4.0.49-agent.jar")
        );
    }

    #[test]
    fn existing_transformer_classpath_skips_injectables() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = engine(dir.path());
        graph.create_configuration(TRANSFORMER_CLASSPATH).unwrap();

        builder().forge(&mut graph, |_| {}).unwrap();

        assert!(graph.dependencies(TRANSFORMER_CLASSPATH).unwrap().is_empty());
    }

    #[test]
    fn a_second_agent_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = engine(dir.path());
        graph.create_configuration(JAVA_AGENTS).unwrap();
        graph
            .add_dependency(JAVA_AGENTS, Dependency::Files(vec!["other-agent.jar".into()]))
            .unwrap();

        let err = builder().fabric(&mut graph, |_| {}).unwrap_err();
        match err {
            ArchitectError::IllegalAgentCount { agents } => assert_eq!(agents.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_builder_freezes_to_an_empty_plan() {
        let plan = builder().freeze();
        assert!(plan.is_empty());
        assert!(plan.agent().is_none());
        assert!(plan.primary().is_none());
    }
}
