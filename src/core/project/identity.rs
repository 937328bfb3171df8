use std::path::Path;

use tracing::debug;
use uuid::Uuid;

use crate::core::error::{ArchitectError, ArchitectResult};

const CACHE_DIR: &str = ".gradle/architectury-cache";
const PROJECT_ID_FILE: &str = "projectID";

/// Identifier unique to this project checkout, stable across builds.
///
/// A random id is generated once and cached under the project's
/// `.gradle/architectury-cache/projectID`. The result only contains Java
/// identifier characters so it can be used as a package segment.
pub fn project_unique_identifier(
    project_dir: &Path,
    project_name: &str,
    root_project_name: Option<&str>,
) -> ArchitectResult<String> {
    let cache = project_dir.join(CACHE_DIR);
    std::fs::create_dir_all(&cache).map_err(|e| ArchitectError::io(&cache, e))?;

    let id_file = cache.join(PROJECT_ID_FILE);
    let cached = std::fs::read_to_string(&id_file)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty());

    let id = match cached {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().simple().to_string();
            std::fs::write(&id_file, &id).map_err(|e| ArchitectError::io(&id_file, e))?;
            debug!("generated project id {} at {:?}", id, id_file);
            id
        }
    };

    let name = match root_project_name {
        Some(root) if root != project_name => format!("{}_{}", root, project_name),
        _ => project_name.to_string(),
    };

    Ok(format!("architectury_inject_{}_{}", name, id)
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_stable_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let first = project_unique_identifier(dir.path(), "fabric", Some("examplemod")).unwrap();
        let second = project_unique_identifier(dir.path(), "fabric", Some("examplemod")).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("architectury_inject_examplemod_fabric_"));
    }

    #[test]
    fn identifier_strips_non_identifier_characters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(CACHE_DIR)).unwrap();
        std::fs::write(dir.path().join(CACHE_DIR).join(PROJECT_ID_FILE), "abc123\n").unwrap();

        let id = project_unique_identifier(dir.path(), "my-mod.common", None).unwrap();
        assert_eq!(id, "architectury_inject_mymodcommon_abc123");
    }
}
