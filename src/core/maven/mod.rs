mod artifact;
mod metadata;
mod resolver;

pub use artifact::MavenArtifact;
pub use metadata::MavenMetadata;
pub use resolver::{LocalRepository, MavenResolver};

/// Repositories the Architectury toolchain publishes to.
pub const ARCHITECTURY_MAVEN: &str = "https://maven.architectury.dev";
pub const FABRIC_MAVEN: &str = "https://maven.fabricmc.net";
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";
