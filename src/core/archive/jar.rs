use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::ArchiveOutput;
use crate::core::error::{ArchitectError, ArchitectResult};

/// Manifest written into placeholder jars.
pub const EMPTY_MANIFEST: &str = "Manifest-Version: 1.0\r\n\r\n";

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// A jar opened for editing. Nothing touches the file until [`commit`](Self::commit).
pub struct JarArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
    pending: Vec<(String, Vec<u8>)>,
}

impl JarArchive {
    pub fn open(path: &Path) -> ArchitectResult<Self> {
        let file = File::open(path).map_err(|e| ArchitectError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive: ZipArchive::new(file)?,
            pending: Vec::new(),
        })
    }

    fn contains(&self, name: &str) -> bool {
        self.pending.iter().any(|(n, _)| n == name) || self.archive.index_for_name(name).is_some()
    }

    fn stage(&mut self, name: &str, content: Vec<u8>) {
        match self.pending.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = content,
            None => self.pending.push((name.to_string(), content)),
        }
    }

    /// Rewrite the jar with the staged changes through a sibling temp file.
    ///
    /// Untouched entries are copied without recompression; replaced entries
    /// keep their position and new ones are appended.
    pub fn commit(self) -> ArchitectResult<()> {
        let JarArchive {
            path,
            mut archive,
            pending,
        } = self;
        if pending.is_empty() {
            return Ok(());
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive.jar".into());
        let temp = path.with_file_name(format!(".{}.tmp", file_name));
        if let Err(e) = rewrite_into(&mut archive, pending, &temp) {
            let _ = std::fs::remove_file(&temp);
            return Err(e);
        }
        drop(archive);

        if let Err(e) = std::fs::rename(&temp, &path) {
            let _ = std::fs::remove_file(&temp);
            return Err(ArchitectError::io(&path, e));
        }
        debug!("rewrote {:?}", path);
        Ok(())
    }
}

fn rewrite_into(
    archive: &mut ZipArchive<File>,
    mut pending: Vec<(String, Vec<u8>)>,
    temp: &Path,
) -> ArchitectResult<()> {
    let out = File::create(temp).map_err(|e| ArchitectError::io(temp, e))?;
    let mut writer = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        let name = entry.name().to_string();
        match pending.iter().position(|(n, _)| *n == name) {
            Some(index) => {
                drop(entry);
                let (name, content) = pending.remove(index);
                writer.start_file(name.as_str(), options)?;
                writer.write_all(&content).map_err(|e| ArchitectError::io(temp, e))?;
            }
            None => writer.raw_copy_file(entry)?,
        }
    }
    for (name, content) in pending {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&content).map_err(|e| ArchitectError::io(temp, e))?;
    }
    writer.finish()?;
    Ok(())
}

impl ArchiveOutput for JarArchive {
    fn entries(&mut self) -> ArchitectResult<Vec<String>> {
        let mut names = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let entry = self.archive.by_index_raw(i)?;
            if !entry.is_dir() {
                names.push(entry.name().to_string());
            }
        }
        for (name, _) in &self.pending {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Ok(names)
    }

    fn get_file(&mut self, path: &str) -> ArchitectResult<Option<Vec<u8>>> {
        if let Some((_, content)) = self.pending.iter().find(|(n, _)| n == path) {
            return Ok(Some(content.clone()));
        }

        let mut entry = match self.archive.by_name(path) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| ArchitectError::io(&self.path, e))?;
        Ok(Some(bytes))
    }

    fn modify_file(&mut self, path: &str, content: Vec<u8>) -> ArchitectResult<()> {
        if !self.contains(path) {
            return Err(ArchitectError::MissingEntry {
                archive: self.path.clone(),
                entry: path.to_string(),
            });
        }
        self.stage(path, content);
        Ok(())
    }

    fn add_file(&mut self, path: &str, content: Vec<u8>) -> ArchitectResult<()> {
        self.stage(path, content);
        Ok(())
    }
}

/// Open `path`, run `edit`, and commit only if `edit` succeeds.
pub fn with_jar<T, F>(path: &Path, edit: F) -> ArchitectResult<T>
where
    F: FnOnce(&mut JarArchive) -> ArchitectResult<T>,
{
    let mut jar = JarArchive::open(path)?;
    let value = edit(&mut jar)?;
    jar.commit()?;
    Ok(value)
}

/// A valid jar holding only a minimal manifest.
pub fn create_empty_jar(path: &Path) -> ArchitectResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ArchitectError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| ArchitectError::io(path, e))?;
    let mut writer = ZipWriter::new(file);
    writer.start_file(MANIFEST_PATH, SimpleFileOptions::default())?;
    writer
        .write_all(EMPTY_MANIFEST.as_bytes())
        .map_err(|e| ArchitectError::io(path, e))?;
    writer.finish()?;
    debug!("created placeholder jar {:?}", path);
    Ok(())
}
