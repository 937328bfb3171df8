use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the whole hand-off pipeline.
/// Every module returns `Result<T, ArchitectError>`.
#[derive(Debug, Error)]
pub enum ArchitectError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("Artifact {0} could not be found in any repository")]
    ArtifactNotFound(String),

    #[error("maven-metadata.xml parse error: {0}")]
    MetadataParse(String),

    // ── Build graph ─────────────────────────────────────
    #[error("Unknown platform '{0}' (expected 'fabric' or 'forge')")]
    UnknownPlatform(String),

    #[error("Configuration '{0}' not found")]
    UnknownConfiguration(String),

    #[error("Configuration '{0}' already exists")]
    ConfigurationExists(String),

    #[error("Illegal Count of Architectury Java Agents! {}", format_paths(.agents))]
    IllegalAgentCount { agents: Vec<PathBuf> },

    // ── Toolchain ───────────────────────────────────────
    #[error("Toolchain contract v{found} is not supported (expected v{expected})")]
    ToolchainContract { expected: u32, found: u32 },

    // ── Runtime files ───────────────────────────────────
    #[error("Malformed properties at line {line}: {message}")]
    Properties { line: usize, message: String },

    // ── Transformer ─────────────────────────────────────
    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    #[error("Transformer exited with {status} while producing {output:?}\nSTDERR:\n{stderr}")]
    TransformerFailed {
        output: PathBuf,
        status: String,
        stderr: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Entry '{entry}' not found in {archive:?}")]
    MissingEntry { archive: PathBuf, entry: String },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type ArchitectResult<T> = Result<T, ArchitectError>;

impl ArchitectError {
    /// Attach a path to a bare IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchitectError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for ArchitectError {
    fn from(source: std::io::Error) -> Self {
        ArchitectError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_agent_count_lists_every_agent() {
        let err = ArchitectError::IllegalAgentCount {
            agents: vec![PathBuf::from("/a/agent-1.jar"), PathBuf::from("/b/agent-2.jar")],
        };
        assert_eq!(
            err.to_string(),
            "Illegal Count of Architectury Java Agents! /a/agent-1.jar, /b/agent-2.jar"
        );
    }
}
