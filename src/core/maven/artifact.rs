use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{ArchitectError, ArchitectResult};

/// A parsed Maven coordinate as used in dependency declarations.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   `groupId:artifactId:version[:classifier]@extension`
///
/// A version ending in `+` (`+`, `0.14.+`) is dynamic and must be pinned
/// against a repository before it maps to a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub extension: String,
}

impl MavenArtifact {
    /// Parse a coordinate string.
    ///
    /// ```
    /// use architect_lib::core::maven::MavenArtifact;
    ///
    /// let agent = MavenArtifact::parse("dev.architectury:architectury-transformer:4.0.49:agent").unwrap();
    /// assert_eq!(agent.classifier.as_deref(), Some("agent"));
    /// ```
    pub fn parse(coord: &str) -> ArchitectResult<Self> {
        let coord = coord.trim();
        let (coord_part, extension) = match coord.rsplit_once('@') {
            Some((head, ext)) if !ext.is_empty() => (head, ext),
            Some(_) => return Err(ArchitectError::InvalidMavenCoordinate(coord.to_string())),
            None => (coord, "jar"),
        };

        let parts: Vec<&str> = coord_part.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ArchitectError::InvalidMavenCoordinate(coord.to_string()));
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(ArchitectError::InvalidMavenCoordinate(coord.to_string())),
        };

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    /// `true` for Gradle-style dynamic versions such as `+` or `1.2.+`.
    pub fn is_dynamic(&self) -> bool {
        self.version.ends_with('+')
    }

    /// Version prefix a dynamic version must match (`"1.2."` for `1.2.+`).
    pub fn version_prefix(&self) -> &str {
        self.version.trim_end_matches('+')
    }

    /// Same coordinate pinned to a concrete version.
    pub fn with_version(&self, version: &str) -> Self {
        let mut pinned = self.clone();
        pinned.version = version.to_string();
        pinned
    }

    /// `net/fabricmc/fabric-loader`
    pub fn module_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in self.group_id.split('.') {
            path.push(segment);
        }
        path.join(&self.artifact_id)
    }

    /// `artifactId-version[-classifier].extension`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Location below a repository root in Maven layout.
    pub fn local_path(&self) -> PathBuf {
        self.module_path().join(&self.version).join(self.filename())
    }

    /// Remote URL of this artifact under `repo_base`.
    pub fn url(&self, repo_base: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            repo_base.trim_end_matches('/'),
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// Remote URL of the module's `maven-metadata.xml`.
    pub fn metadata_url(&self, repo_base: &str) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            repo_base.trim_end_matches('/'),
            self.group_id.replace('.', "/"),
            self.artifact_id
        )
    }

    /// Whether a concrete `candidate` version satisfies this (possibly dynamic) version.
    pub fn accepts_version(&self, candidate: &str) -> bool {
        if self.is_dynamic() {
            candidate.starts_with(self.version_prefix())
        } else {
            candidate == self.version
        }
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

fn parse_numeric_version_parts(raw: &str) -> Vec<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.parse::<u32>().ok())
        .collect()
}

/// Numeric-aware version ordering used to pick the newest dynamic match.
pub(crate) fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_numeric_version_parts(a);
    let b_parts = parse_numeric_version_parts(b);

    let max_len = a_parts.len().max(b_parts.len());
    for idx in 0..max_len {
        let a_val = a_parts.get(idx).copied().unwrap_or(0);
        let b_val = b_parts.get(idx).copied().unwrap_or(0);
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }

    // Deterministic tiebreaker for versions with identical numeric parts.
    a.cmp(b)
}
