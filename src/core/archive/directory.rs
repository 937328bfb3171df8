use std::path::{Path, PathBuf};

use super::ArchiveOutput;
use crate::core::error::{ArchitectError, ArchitectResult};

/// An exploded archive on disk. Writes go straight to the files.
#[derive(Debug, Clone)]
pub struct DirectoryOutput {
    root: PathBuf,
}

impl DirectoryOutput {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn walk(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> ArchitectResult<()> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| ArchitectError::io(dir, e))?
            .filter_map(Result::ok)
            .collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let name = format!("{}{}", prefix, entry.file_name().to_string_lossy());
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, &format!("{}/", name), out)?;
            } else {
                out.push(name);
            }
        }
        Ok(())
    }
}

impl ArchiveOutput for DirectoryOutput {
    fn entries(&mut self) -> ArchitectResult<Vec<String>> {
        let mut names = Vec::new();
        self.walk(&self.root, "", &mut names)?;
        Ok(names)
    }

    fn get_file(&mut self, path: &str) -> ArchitectResult<Option<Vec<u8>>> {
        let file = self.root.join(path);
        if !file.is_file() {
            return Ok(None);
        }
        std::fs::read(&file)
            .map(Some)
            .map_err(|e| ArchitectError::io(&file, e))
    }

    fn modify_file(&mut self, path: &str, content: Vec<u8>) -> ArchitectResult<()> {
        let file = self.root.join(path);
        if !file.is_file() {
            return Err(ArchitectError::MissingEntry {
                archive: self.root.clone(),
                entry: path.to_string(),
            });
        }
        std::fs::write(&file, content).map_err(|e| ArchitectError::io(&file, e))
    }

    fn add_file(&mut self, path: &str, content: Vec<u8>) -> ArchitectResult<()> {
        let file = self.root.join(path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ArchitectError::io(parent, e))?;
        }
        std::fs::write(&file, content).map_err(|e| ArchitectError::io(&file, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_use_forward_slashes_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = DirectoryOutput::new(dir.path());
        output.add_file("z.json", b"{}".to_vec()).unwrap();
        output.add_file("assets/examplemod/lang/en_us.json", b"{}".to_vec()).unwrap();

        assert_eq!(
            output.entries().unwrap(),
            vec!["assets/examplemod/lang/en_us.json", "z.json"]
        );
        assert!(output.modify_file("missing.json", Vec::new()).is_err());
        assert_eq!(output.get_file("z.json").unwrap().unwrap(), b"{}");
    }
}
