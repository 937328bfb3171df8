use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{ArchitectError, ArchitectResult};

const STATE_DIR: &str = ".gradle/architectury";
const AGENT_FILE: &str = "architectury-transformer-agent.jar";

/// On-disk locations shared between the writer, the launch patcher and the
/// transformer process.
///
/// Obtained through [`GeneratedArtifactFiles::prepare`], which creates every
/// parent directory up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifactFiles {
    pub main_class: PathBuf,
    pub transforms: PathBuf,
    pub properties: PathBuf,
    /// Cached copy of the instrumentation agent, shared by the root project.
    pub agent: PathBuf,
}

impl GeneratedArtifactFiles {
    /// Paths without touching the filesystem.
    pub fn locate(project_dir: &Path, root_project_dir: &Path) -> Self {
        let state = project_dir.join(STATE_DIR);
        Self {
            main_class: state.join(".main_class"),
            transforms: state.join(".transforms"),
            properties: state.join(".properties"),
            agent: root_project_dir.join(STATE_DIR).join(AGENT_FILE),
        }
    }

    /// Locate and create the parent directories of every file.
    pub fn prepare(project_dir: &Path, root_project_dir: &Path) -> ArchitectResult<Self> {
        let files = Self::locate(project_dir, root_project_dir);
        for path in [&files.main_class, &files.transforms, &files.properties, &files.agent] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ArchitectError::io(parent, e))?;
            }
        }
        debug!("prepared runtime artifact directories under {:?}", project_dir);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_creates_project_and_root_state_dirs() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("fabric");

        let files = GeneratedArtifactFiles::prepare(&project, root.path()).unwrap();

        assert!(project.join(".gradle/architectury").is_dir());
        assert_eq!(files.properties, project.join(".gradle/architectury/.properties"));
        assert_eq!(
            files.agent,
            root.path()
                .join(".gradle/architectury/architectury-transformer-agent.jar")
        );
        assert!(files.agent.parent().unwrap().is_dir());
        // Nothing is written yet.
        assert!(!files.transforms.exists());
    }
}
