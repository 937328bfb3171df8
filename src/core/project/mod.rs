mod graph;
mod identity;
mod layout;
mod settings;

pub use graph::{
    BuildEngine, Dependency, ProjectGraph, TaskAction, TaskSpec, BUILD_TASK, COMPILE_CLASSPATH,
    COMPILE_ONLY, JAR_TASK, JAVA_AGENTS, REMAP_JAR_TASK, RUNTIME_ONLY, TRANSFORMER_CLASSPATH,
};
pub use identity::project_unique_identifier;
pub use layout::GeneratedArtifactFiles;
pub use settings::{ArchitecturySettings, CommonSettings, SETTINGS_FILE};

use std::path::{Path, PathBuf};

use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::maven::LocalRepository;
use crate::core::toolchain::StaticToolchain;

/// Repository the `fetch` command downloads into, under the root project.
const MANAGED_REPOSITORY: &str = ".gradle/architectury/repository";

/// A project directory together with its loaded settings.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub dir: PathBuf,
    pub root_dir: PathBuf,
    pub settings: ArchitecturySettings,
}

impl ProjectContext {
    pub fn load(project_dir: &Path) -> ArchitectResult<Self> {
        let dir = std::fs::canonicalize(project_dir)
            .map_err(|e| ArchitectError::io(project_dir, e))?;
        let settings = ArchitecturySettings::load_or_default(&dir)?;
        let root_dir = match &settings.root_project {
            Some(root) => std::fs::canonicalize(dir.join(root))
                .map_err(|e| ArchitectError::io(dir.join(root), e))?,
            None => dir.clone(),
        };

        Ok(Self {
            dir,
            root_dir,
            settings,
        })
    }

    pub fn name(&self) -> String {
        self.settings
            .project_name
            .clone()
            .unwrap_or_else(|| dir_name(&self.dir))
    }

    /// `None` when this project is the root project.
    pub fn root_name(&self) -> Option<String> {
        (self.root_dir != self.dir).then(|| dir_name(&self.root_dir))
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.dir.join(&self.settings.runs_dir)
    }

    /// Managed repository first, then configured ones, then `~/.m2/repository`.
    pub fn local_repository(&self) -> LocalRepository {
        let mut roots = vec![self.root_dir.join(MANAGED_REPOSITORY)];
        roots.extend(
            self.settings
                .local_repositories
                .iter()
                .map(|repo| self.dir.join(repo)),
        );
        if let Some(home) = dirs::home_dir() {
            roots.push(home.join(".m2").join("repository"));
        }
        LocalRepository::new(roots)
    }

    /// Build graph seeded with the file-based configurations from settings.
    pub fn graph(&self) -> ArchitectResult<ProjectGraph> {
        let mut graph = ProjectGraph::new(
            self.dir.clone(),
            self.settings
                .archives_base_name
                .clone()
                .unwrap_or_else(|| self.name()),
            self.settings.version.clone(),
            self.local_repository(),
        );

        for (name, files) in &self.settings.configurations {
            if !graph.has_configuration(name) {
                graph.create_configuration(name)?;
            }
            graph.add_dependency(name, Dependency::Files(files.clone()))?;
        }

        Ok(graph)
    }

    pub fn toolchain(&self) -> Option<StaticToolchain> {
        self.settings.toolchain.clone().map(StaticToolchain::new)
    }

    pub fn unique_identifier(&self) -> ArchitectResult<String> {
        project_unique_identifier(&self.dir, &self.name(), self.root_name().as_deref())
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subproject_resolves_root_and_names() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("fabric");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(
            project.join(SETTINGS_FILE),
            r#"{ "root_project": "..", "configurations": { "developmentFabric": ["../common/build/classes"] } }"#,
        )
        .unwrap();

        let ctx = ProjectContext::load(&project).unwrap();
        assert_eq!(ctx.name(), "fabric");
        assert_eq!(ctx.root_dir, std::fs::canonicalize(root.path()).unwrap());
        assert!(ctx.root_name().is_some());

        let graph = ctx.graph().unwrap();
        assert_eq!(
            graph.resolve("developmentFabric").unwrap(),
            vec![ctx.dir.join("../common/build/classes")]
        );
    }
}
