// ─── Runtime hand-off ───
// Files read by the transformer process during development runs:
// the step manifest and the properties bag.

mod manifest;
pub mod properties;
mod writer;

pub use manifest::{RuntimeManifest, RuntimeManifestEntry};
pub use writer::{
    PropertySources, RuntimeArtifactWriter, RuntimeProperties, WrittenArtifacts,
    COMPILE_CLASSPATH_KEY, INJECT_INJECTABLES, MAPPINGS_WITH_SRG, MCMETA_VERSION, MIXIN_MAPPINGS,
    PLATFORM_NAME, PROPERTIES_HEADER, REFMAP_NAME, UNIQUE_IDENTIFIER,
};
