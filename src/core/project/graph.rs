use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::maven::{LocalRepository, MavenArtifact};

pub const COMPILE_CLASSPATH: &str = "compileClasspath";
pub const COMPILE_ONLY: &str = "compileOnly";
pub const RUNTIME_ONLY: &str = "runtimeOnly";
pub const TRANSFORMER_CLASSPATH: &str = "architecturyTransformerClasspath";
pub const JAVA_AGENTS: &str = "architecturyJavaAgents";

pub const BUILD_TASK: &str = "build";
pub const JAR_TASK: &str = "jar";
pub const REMAP_JAR_TASK: &str = "remapJar";

/// A dependency declared on a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Module(MavenArtifact),
    Files(Vec<PathBuf>),
}

impl Dependency {
    pub fn module(coord: &str) -> ArchitectResult<Self> {
        Ok(Dependency::Module(MavenArtifact::parse(coord)?))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Module(artifact) => write!(f, "{}", artifact),
            Dependency::Files(files) => write!(f, "files({} entries)", files.len()),
        }
    }
}

/// Extra work attached to a task, run after its main action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    AddCommonMarker,
}

/// The slice of an archive task the hand-off cares about.
#[derive(Debug, Clone, Default)]
pub struct TaskSpec {
    pub name: String,
    /// `None` for non-archive tasks, `Some("")` for an unclassified archive.
    pub archive_classifier: Option<String>,
    /// Input archive, as the name of the task producing it.
    pub input_from: Option<String>,
    pub depends_on: BTreeSet<String>,
    pub do_last: Vec<TaskAction>,
}

/// The host build engine, seen from the hand-off.
pub trait BuildEngine {
    fn project_dir(&self) -> &Path;

    fn has_configuration(&self, name: &str) -> bool;

    /// Create an empty configuration. Creating an existing one is an error.
    fn create_configuration(&mut self, name: &str) -> ArchitectResult<()>;

    /// Make `child` inherit every dependency of `parent`.
    fn extend_configuration(&mut self, child: &str, parent: &str) -> ArchitectResult<()>;

    fn add_dependency(&mut self, configuration: &str, dependency: Dependency)
        -> ArchitectResult<()>;

    /// Resolve a configuration (including inherited ones) to files.
    fn resolve(&self, configuration: &str) -> ArchitectResult<Vec<PathBuf>>;

    fn task(&self, name: &str) -> Option<&TaskSpec>;

    /// Get-or-create a task for configuration.
    fn task_mut(&mut self, name: &str) -> &mut TaskSpec;

    /// Publish `task`'s archive on `configuration`.
    fn add_artifact(&mut self, configuration: &str, task: &str) -> ArchitectResult<()>;

    /// Output file of an archive task.
    fn archive_file(&self, task: &str) -> Option<PathBuf>;
}

#[derive(Debug, Default)]
struct Configuration {
    dependencies: Vec<Dependency>,
    extends_from: Vec<String>,
    artifacts: Vec<String>,
}

/// In-memory build graph backed by local Maven repositories.
#[derive(Debug)]
pub struct ProjectGraph {
    project_dir: PathBuf,
    archives_base_name: String,
    version: String,
    repository: LocalRepository,
    configurations: BTreeMap<String, Configuration>,
    tasks: BTreeMap<String, TaskSpec>,
}

impl ProjectGraph {
    /// A graph with the standard Java configurations and archive tasks.
    pub fn new(
        project_dir: PathBuf,
        archives_base_name: String,
        version: String,
        repository: LocalRepository,
    ) -> Self {
        let mut graph = Self {
            project_dir,
            archives_base_name,
            version,
            repository,
            configurations: BTreeMap::new(),
            tasks: BTreeMap::new(),
        };

        for name in [COMPILE_CLASSPATH, COMPILE_ONLY, RUNTIME_ONLY] {
            graph.configurations.insert(name.to_string(), Configuration::default());
        }
        if let Some(compile_classpath) = graph.configurations.get_mut(COMPILE_CLASSPATH) {
            compile_classpath.extends_from.push(COMPILE_ONLY.to_string());
        }

        graph.task_mut(BUILD_TASK);
        graph.task_mut(JAR_TASK).archive_classifier = Some(String::new());
        graph.task_mut(REMAP_JAR_TASK).archive_classifier = Some(String::new());
        graph
    }

    pub fn repository(&self) -> &LocalRepository {
        &self.repository
    }

    pub fn dependencies(&self, configuration: &str) -> ArchitectResult<&[Dependency]> {
        self.configurations
            .get(configuration)
            .map(|c| c.dependencies.as_slice())
            .ok_or_else(|| ArchitectError::UnknownConfiguration(configuration.to_string()))
    }

    /// Tasks whose archives are published on `configuration`.
    pub fn artifacts(&self, configuration: &str) -> ArchitectResult<&[String]> {
        self.configurations
            .get(configuration)
            .map(|c| c.artifacts.as_slice())
            .ok_or_else(|| ArchitectError::UnknownConfiguration(configuration.to_string()))
    }

    /// Every module dependency declared anywhere in the graph.
    pub fn module_dependencies(&self) -> Vec<MavenArtifact> {
        let mut seen = HashSet::new();
        self.configurations
            .values()
            .flat_map(|c| c.dependencies.iter())
            .filter_map(|d| match d {
                Dependency::Module(artifact) => Some(artifact.clone()),
                Dependency::Files(_) => None,
            })
            .filter(|a| seen.insert(a.clone()))
            .collect()
    }

    fn configuration_mut(&mut self, name: &str) -> ArchitectResult<&mut Configuration> {
        self.configurations
            .get_mut(name)
            .ok_or_else(|| ArchitectError::UnknownConfiguration(name.to_string()))
    }

    fn collect(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        out: &mut Vec<PathBuf>,
    ) -> ArchitectResult<()> {
        if !visited.insert(name.to_string()) {
            return Ok(());
        }

        let configuration = self
            .configurations
            .get(name)
            .ok_or_else(|| ArchitectError::UnknownConfiguration(name.to_string()))?;

        for dependency in &configuration.dependencies {
            match dependency {
                Dependency::Module(artifact) => out.push(self.repository.require(artifact)?),
                Dependency::Files(files) => {
                    out.extend(files.iter().map(|f| self.project_dir.join(f)));
                }
            }
        }

        for parent in &configuration.extends_from {
            self.collect(parent, visited, out)?;
        }

        Ok(())
    }
}

impl BuildEngine for ProjectGraph {
    fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn has_configuration(&self, name: &str) -> bool {
        self.configurations.contains_key(name)
    }

    fn create_configuration(&mut self, name: &str) -> ArchitectResult<()> {
        if self.configurations.contains_key(name) {
            return Err(ArchitectError::ConfigurationExists(name.to_string()));
        }
        debug!("created configuration {}", name);
        self.configurations
            .insert(name.to_string(), Configuration::default());
        Ok(())
    }

    fn extend_configuration(&mut self, child: &str, parent: &str) -> ArchitectResult<()> {
        if !self.configurations.contains_key(parent) {
            return Err(ArchitectError::UnknownConfiguration(parent.to_string()));
        }
        let child = self.configuration_mut(child)?;
        if !child.extends_from.iter().any(|p| p == parent) {
            child.extends_from.push(parent.to_string());
        }
        Ok(())
    }

    fn add_dependency(
        &mut self,
        configuration: &str,
        dependency: Dependency,
    ) -> ArchitectResult<()> {
        debug!("{} <- {}", configuration, dependency);
        self.configuration_mut(configuration)?
            .dependencies
            .push(dependency);
        Ok(())
    }

    fn resolve(&self, configuration: &str) -> ArchitectResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.collect(configuration, &mut HashSet::new(), &mut files)?;

        let mut seen = HashSet::new();
        files.retain(|f| seen.insert(f.clone()));
        Ok(files)
    }

    fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    fn task_mut(&mut self, name: &str) -> &mut TaskSpec {
        self.tasks.entry(name.to_string()).or_insert_with(|| TaskSpec {
            name: name.to_string(),
            ..TaskSpec::default()
        })
    }

    fn add_artifact(&mut self, configuration: &str, task: &str) -> ArchitectResult<()> {
        self.configuration_mut(configuration)?
            .artifacts
            .push(task.to_string());
        Ok(())
    }

    fn archive_file(&self, task: &str) -> Option<PathBuf> {
        let classifier = self.tasks.get(task)?.archive_classifier.as_deref()?;
        let file_name = if classifier.is_empty() {
            format!("{}-{}.jar", self.archives_base_name, self.version)
        } else {
            format!("{}-{}-{}.jar", self.archives_base_name, self.version, classifier)
        };
        Some(self.project_dir.join("build").join("libs").join(file_name))
    }
}
