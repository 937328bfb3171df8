use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::manifest::RuntimeManifest;
use super::properties;
use crate::core::error::ArchitectResult;
use crate::core::launch::join_classpath;
use crate::core::platform::{Platform, TransformPlan};
use crate::core::project::{
    BuildEngine, GeneratedArtifactFiles, COMPILE_CLASSPATH, TRANSFORMER_CLASSPATH,
};
use crate::core::toolchain::{ensure_compatible, MappingsProvider};

pub const MIXIN_MAPPINGS: &str = "architectury.mixin.mappings";
pub const INJECT_INJECTABLES: &str = "architectury.inject.injectables";
pub const UNIQUE_IDENTIFIER: &str = "architectury.unique.identifier";
pub const COMPILE_CLASSPATH_KEY: &str = "architectury.compile.classpath";
pub const MAPPINGS_WITH_SRG: &str = "architectury.mappings.with.srg";
pub const PLATFORM_NAME: &str = "architectury.platform.name";
pub const REFMAP_NAME: &str = "architectury.refmap.name";
pub const MCMETA_VERSION: &str = "architectury.mcmeta.version";

pub const PROPERTIES_HEADER: &str = "Architectury Runtime Transformer Properties";

/// Key/value bag handed to the transformer for one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeProperties(BTreeMap<String, String>);

impl RuntimeProperties {
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

/// Inputs the property bag is assembled from.
pub struct PropertySources<'a> {
    pub engine: &'a dyn BuildEngine,
    pub toolchain: Option<&'a dyn MappingsProvider>,
    pub inject_injectables: bool,
    pub unique_identifier: String,
}

impl PropertySources<'_> {
    /// Properties for `platform`; empty without a toolchain.
    pub fn collect(&self, platform: Platform) -> ArchitectResult<RuntimeProperties> {
        let toolchain = match self.toolchain {
            Some(toolchain) => toolchain,
            None => {
                debug!("no mappings toolchain configured, properties stay empty");
                return Ok(RuntimeProperties::default());
            }
        };
        ensure_compatible(toolchain)?;

        let classpath_config = if self.engine.has_configuration(TRANSFORMER_CLASSPATH) {
            TRANSFORMER_CLASSPATH
        } else {
            COMPILE_CLASSPATH
        };
        let classpath = self.engine.resolve(classpath_config)?;

        let mut map = BTreeMap::new();
        map.insert(
            MIXIN_MAPPINGS.to_string(),
            join_classpath(&toolchain.mixin_mappings()),
        );
        map.insert(
            INJECT_INJECTABLES.to_string(),
            self.inject_injectables.to_string(),
        );
        map.insert(UNIQUE_IDENTIFIER.to_string(), self.unique_identifier.clone());
        map.insert(COMPILE_CLASSPATH_KEY.to_string(), join_classpath(&classpath));
        map.insert(
            MAPPINGS_WITH_SRG.to_string(),
            toolchain
                .tiny_mappings_with_srg()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        map.insert(PLATFORM_NAME.to_string(), platform.name().to_string());
        map.insert(REFMAP_NAME.to_string(), toolchain.refmap_name());
        map.insert(MCMETA_VERSION.to_string(), "4".to_string());
        Ok(RuntimeProperties(map))
    }
}

/// What [`RuntimeArtifactWriter::write`] put on disk.
#[derive(Debug, Clone)]
pub struct WrittenArtifacts {
    pub manifest: RuntimeManifest,
    pub platform: Platform,
    pub properties: RuntimeProperties,
}

/// Flushes the manifest and properties files for a frozen plan.
pub struct RuntimeArtifactWriter<'a> {
    files: &'a GeneratedArtifactFiles,
    sources: PropertySources<'a>,
}

impl<'a> RuntimeArtifactWriter<'a> {
    pub fn new(files: &'a GeneratedArtifactFiles, sources: PropertySources<'a>) -> Self {
        Self { files, sources }
    }

    /// Writes nothing and returns `None` for an empty plan.
    ///
    /// The properties file describes the first registered platform; the
    /// manifest covers every platform.
    pub fn write(&self, plan: &TransformPlan) -> ArchitectResult<Option<WrittenArtifacts>> {
        let primary = match plan.primary() {
            Some(primary) => primary.platform(),
            None => {
                debug!("no platforms registered, skipping runtime artifacts");
                return Ok(None);
            }
        };
        if plan.registrations().len() > 1 {
            let others: Vec<&str> = plan.registrations()[1..]
                .iter()
                .map(|r| r.platform().name())
                .collect();
            warn!(
                "runtime properties describe {} only; {} use the manifest alone",
                primary,
                others.join(", ")
            );
        }

        let manifest = RuntimeManifest::from_plan(plan, self.sources.engine)?;
        let properties = self.sources.collect(primary)?;

        manifest.write(&self.files.transforms)?;
        properties::write_file(&self.files.properties, properties.as_map(), PROPERTIES_HEADER)?;
        info!(
            "wrote runtime manifest ({} entries) and {} properties for {}",
            manifest.entries().count(),
            properties.as_map().len(),
            primary
        );

        Ok(Some(WrittenArtifacts {
            manifest,
            platform: primary,
            properties,
        }))
    }
}
