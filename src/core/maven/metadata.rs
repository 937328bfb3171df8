use quick_xml::de::from_str;
use serde::Deserialize;

use super::artifact::compare_versions;
use crate::core::error::{ArchitectError, ArchitectResult};

/// Minimal `maven-metadata.xml` model, enough to pin dynamic versions.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MavenMetadata {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub versioning: Option<Versioning>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Option<Versions>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Versions {
    #[serde(default, rename = "version")]
    pub items: Vec<String>,
}

impl MavenMetadata {
    pub fn parse(xml: &str) -> ArchitectResult<Self> {
        from_str(xml).map_err(|e| ArchitectError::MetadataParse(e.to_string()))
    }

    /// Every published version, in document order.
    pub fn versions(&self) -> &[String] {
        self.versioning
            .as_ref()
            .and_then(|v| v.versions.as_ref())
            .map(|v| v.items.as_slice())
            .unwrap_or(&[])
    }

    /// Newest version starting with `prefix`.
    ///
    /// An empty prefix (plain `+`) prefers the advertised `release`, falling
    /// back to the numerically highest listed version.
    pub fn newest_matching(&self, prefix: &str) -> Option<String> {
        if prefix.is_empty() {
            if let Some(release) = self.versioning.as_ref().and_then(|v| v.release.clone()) {
                return Some(release);
            }
        }

        self.versions()
            .iter()
            .filter(|v| v.starts_with(prefix))
            .max_by(|a, b| compare_versions(a, b))
            .cloned()
    }
}
