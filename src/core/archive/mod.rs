// ─── Archive outputs ───
// Uniform read/modify/add access to a jar or an exploded directory.
// Jar edits are buffered and committed in one rewrite.

mod directory;
mod jar;

pub use directory::DirectoryOutput;
pub use jar::{create_empty_jar, with_jar, JarArchive, EMPTY_MANIFEST};

use crate::core::error::ArchitectResult;

/// Files inside an archive, addressed by `/`-separated names.
pub trait ArchiveOutput {
    /// File entries (no directories), in archive order.
    fn entries(&mut self) -> ArchitectResult<Vec<String>>;

    fn get_file(&mut self, path: &str) -> ArchitectResult<Option<Vec<u8>>>;

    /// Replace an existing file. Fails if `path` is absent.
    fn modify_file(&mut self, path: &str, content: Vec<u8>) -> ArchitectResult<()>;

    /// Add `path`, replacing it if present.
    fn add_file(&mut self, path: &str, content: Vec<u8>) -> ArchitectResult<()>;
}
