use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::launch::{get_classpath_separator, safe_path_str};
use crate::core::platform::{TransformPlan, TransformStep};
use crate::core::project::BuildEngine;

/// One `path|class` token of the runtime manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeManifestEntry {
    pub path: PathBuf,
    pub step_class: String,
}

/// Which steps apply to which classpath entry during a development run.
///
/// Each path appears once. A later registration listing the same path
/// replaces its steps but keeps the path's first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeManifest {
    paths: Vec<(PathBuf, Vec<TransformStep>)>,
}

impl RuntimeManifest {
    /// Resolve every registration's configuration against `engine`.
    pub fn from_plan(plan: &TransformPlan, engine: &dyn BuildEngine) -> ArchitectResult<Self> {
        let mut manifest = Self::default();
        for registration in plan.registrations() {
            for path in engine.resolve(registration.configuration_name())? {
                manifest.insert(PathBuf::from(safe_path_str(&path)), registration.steps());
            }
        }
        Ok(manifest)
    }

    pub fn insert(&mut self, path: PathBuf, steps: &[TransformStep]) {
        match self.paths.iter_mut().find(|(p, _)| *p == path) {
            Some((_, existing)) => *existing = steps.to_vec(),
            None => self.paths.push((path, steps.to_vec())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = RuntimeManifestEntry> + '_ {
        self.paths.iter().flat_map(|(path, steps)| {
            steps.iter().map(move |step| RuntimeManifestEntry {
                path: path.clone(),
                step_class: step.class_name(),
            })
        })
    }

    /// Parse manifest text back into entries.
    pub fn parse(text: &str) -> ArchitectResult<Vec<RuntimeManifestEntry>> {
        text.split(get_classpath_separator())
            .filter(|token| !token.trim().is_empty())
            .map(|token| {
                let (path, class) = token.rsplit_once('|').ok_or_else(|| {
                    ArchitectError::Other(format!("malformed manifest entry '{}'", token))
                })?;
                Ok(RuntimeManifestEntry {
                    path: PathBuf::from(path),
                    step_class: class.to_string(),
                })
            })
            .collect()
    }

    pub fn write(&self, path: &Path) -> ArchitectResult<()> {
        std::fs::write(path, self.to_string()).map_err(|e| ArchitectError::io(path, e))
    }
}

impl fmt::Display for RuntimeManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries().enumerate() {
            if i > 0 {
                f.write_str(get_classpath_separator())?;
            }
            write!(f, "{}|{}", entry.path.display(), entry.step_class)?;
        }
        Ok(())
    }
}
