use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::artifact::{compare_versions, MavenArtifact};
use super::metadata::MavenMetadata;
use crate::core::downloader::{DownloadEntry, Downloader};
use crate::core::error::{ArchitectError, ArchitectResult};

/// A set of on-disk repositories in Maven layout, searched in order.
///
/// Resolution is non-transitive: a coordinate maps to exactly one file.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    roots: Vec<PathBuf>,
}

impl LocalRepository {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Where fetched artifacts are stored (the first root).
    pub fn primary(&self) -> Option<&Path> {
        self.roots.first().map(PathBuf::as_path)
    }

    /// Find the file for `artifact`, pinning dynamic versions to the newest
    /// matching version present on disk.
    pub fn find(&self, artifact: &MavenArtifact) -> Option<PathBuf> {
        for root in &self.roots {
            let pinned = if artifact.is_dynamic() {
                match newest_local_version(root, artifact) {
                    Some(version) => artifact.with_version(&version),
                    None => continue,
                }
            } else {
                artifact.clone()
            };

            let candidate = root.join(pinned.local_path());
            if candidate.is_file() {
                debug!("Resolved {} -> {:?}", artifact, candidate);
                return Some(candidate);
            }
        }

        None
    }

    /// Like [`find`](Self::find) but failing with `ArtifactNotFound`.
    pub fn require(&self, artifact: &MavenArtifact) -> ArchitectResult<PathBuf> {
        self.find(artifact)
            .ok_or_else(|| ArchitectError::ArtifactNotFound(artifact.to_string()))
    }
}

fn newest_local_version(root: &Path, artifact: &MavenArtifact) -> Option<String> {
    let module_dir = root.join(artifact.module_path());
    let entries = std::fs::read_dir(&module_dir).ok()?;

    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|version| artifact.accepts_version(version))
        .filter(|version| root.join(artifact.with_version(version).local_path()).is_file())
        .max_by(|a, b| compare_versions(a, b))
}

/// Fetches missing artifacts from remote repositories into the primary
/// local repository.
pub struct MavenResolver {
    /// Ordered list of repository base URLs to search.
    pub repositories: Vec<String>,
    local: LocalRepository,
    downloader: Downloader,
}

impl MavenResolver {
    pub fn new(repositories: Vec<String>, local: LocalRepository, downloader: Downloader) -> Self {
        Self {
            repositories,
            local,
            downloader,
        }
    }

    /// Make every artifact available locally.
    ///
    /// Artifacts already present are skipped; dynamic versions are pinned
    /// through `maven-metadata.xml` first. Returns the number downloaded.
    pub async fn fetch_all(&self, artifacts: &[MavenArtifact]) -> ArchitectResult<usize> {
        let Some(primary) = self.local.primary() else {
            return Err(ArchitectError::Other(
                "No local repository configured to store fetched artifacts".into(),
            ));
        };

        let mut pending = Vec::new();
        for artifact in artifacts {
            if self.local.find(artifact).is_some() {
                debug!("{} already available locally", artifact);
                continue;
            }

            let (pinned, repo) = self.locate_remote(artifact).await?;
            let sha1 = self
                .downloader
                .fetch_text(&format!("{}.sha1", pinned.url(&repo)))
                .await
                .ok()
                .and_then(|text| text.split_whitespace().next().map(str::to_string));

            pending.push(DownloadEntry {
                url: pinned.url(&repo),
                dest: primary.join(pinned.local_path()),
                sha1,
            });
        }

        let total = pending.len();
        let failures = self.downloader.download_batch(pending).await;
        if let Some((entry, err)) = failures.into_iter().next() {
            warn!("Download of {} failed: {}", entry.url, err);
            return Err(err);
        }

        info!("Fetched {} artifact(s)", total);
        Ok(total)
    }

    /// Find the first repository that publishes `artifact`, pinning its version.
    async fn locate_remote(
        &self,
        artifact: &MavenArtifact,
    ) -> ArchitectResult<(MavenArtifact, String)> {
        if !artifact.is_dynamic() {
            return Ok((artifact.clone(), self.first_hosting(artifact).await?));
        }

        for repo in &self.repositories {
            match self.downloader.fetch_text(&artifact.metadata_url(repo)).await {
                Ok(xml) => {
                    let metadata = MavenMetadata::parse(&xml)?;
                    if let Some(version) = metadata.newest_matching(artifact.version_prefix()) {
                        debug!("Pinned {} to {} via {}", artifact, version, repo);
                        return Ok((artifact.with_version(&version), repo.clone()));
                    }
                }
                Err(e) => debug!("No metadata for {} in {}: {}", artifact, repo, e),
            }
        }

        Err(ArchitectError::ArtifactNotFound(artifact.to_string()))
    }

    /// Probe repositories in order for a concrete artifact via its `.sha1`
    /// sidecar, falling back to the first repository when none publish one.
    async fn first_hosting(&self, artifact: &MavenArtifact) -> ArchitectResult<String> {
        for repo in &self.repositories {
            let probe = format!("{}.sha1", artifact.url(repo));
            match self.downloader.fetch_text(&probe).await {
                Ok(_) => return Ok(repo.clone()),
                Err(e) => debug!("Repository {} failed for {}: {}", repo, artifact, e),
            }
        }

        self.repositories
            .first()
            .cloned()
            .ok_or_else(|| ArchitectError::Other(format!("No repositories configured for {}", artifact)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publish(root: &Path, coord: &str) -> PathBuf {
        let artifact = MavenArtifact::parse(coord).unwrap();
        let path = root.join(artifact.local_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"jar").unwrap();
        path
    }

    #[test]
    fn finds_exact_version_in_later_root() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let expected = publish(
            second.path(),
            "dev.architectury:architectury-transformer:4.0.49:agent",
        );

        let repo = LocalRepository::new(vec![first.path().into(), second.path().into()]);
        let artifact =
            MavenArtifact::parse("dev.architectury:architectury-transformer:4.0.49:agent").unwrap();
        assert_eq!(repo.find(&artifact), Some(expected));
    }

    #[test]
    fn dynamic_version_picks_newest_present_file() {
        let root = tempfile::tempdir().unwrap();
        publish(root.path(), "net.fabricmc:fabric-loader:0.14.22");
        let newest = publish(root.path(), "net.fabricmc:fabric-loader:0.16.10");
        publish(root.path(), "net.fabricmc:fabric-loader:0.16.9");
        // A version directory without the jar must not win.
        std::fs::create_dir_all(root.path().join("net/fabricmc/fabric-loader/0.99.0")).unwrap();

        let repo = LocalRepository::new(vec![root.path().into()]);
        let artifact = MavenArtifact::parse("net.fabricmc:fabric-loader:+").unwrap();
        assert_eq!(repo.find(&artifact), Some(newest));
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(vec![root.path().into()]);
        let artifact = MavenArtifact::parse("dev.architectury:architectury-injectables:1.0.10")
            .unwrap();

        let err = repo.require(&artifact).unwrap_err();
        assert!(matches!(err, ArchitectError::ArtifactNotFound(_)));
    }
}
