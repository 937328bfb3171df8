// ─── Toolchain ───
// Contract with the mappings/remapping provider (Loom) that feeds the
// runtime properties.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::{ArchitectError, ArchitectResult};

/// Version of the accessor contract this crate was written against.
///
/// Version 1 exposes the SRG-merged tiny mappings path as a plain accessor
/// instead of a provider-internal field.
pub const MAPPINGS_CONTRACT_VERSION: u32 = 1;

/// Read-only view of the mapping provider.
pub trait MappingsProvider {
    /// Contract version implemented by this provider.
    fn contract_version(&self) -> u32;

    /// Every mixin mapping file the toolchain generated.
    fn mixin_mappings(&self) -> Vec<PathBuf>;

    /// Name of the refmap written into mixin configs.
    fn refmap_name(&self) -> String;

    /// Tiny mappings merged with SRG names (Forge only; absent otherwise).
    fn tiny_mappings_with_srg(&self) -> Option<PathBuf>;
}

/// Check a provider before reading from it.
pub fn ensure_compatible(provider: &dyn MappingsProvider) -> ArchitectResult<()> {
    let found = provider.contract_version();
    if found != MAPPINGS_CONTRACT_VERSION {
        return Err(ArchitectError::ToolchainContract {
            expected: MAPPINGS_CONTRACT_VERSION,
            found,
        });
    }
    Ok(())
}

/// Toolchain outputs as recorded in the project settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    pub contract_version: u32,
    pub mixin_mappings: Vec<PathBuf>,
    pub refmap_name: String,
    pub tiny_mappings_with_srg: Option<PathBuf>,
    /// Set by the `common` entry point when Forge packaging is enabled.
    pub generate_srg_tiny: bool,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            contract_version: MAPPINGS_CONTRACT_VERSION,
            mixin_mappings: Vec::new(),
            refmap_name: "refmap.json".into(),
            tiny_mappings_with_srg: None,
            generate_srg_tiny: false,
        }
    }
}

/// A provider backed by fixed values.
#[derive(Debug, Clone)]
pub struct StaticToolchain {
    settings: ToolchainSettings,
}

impl StaticToolchain {
    pub fn new(settings: ToolchainSettings) -> Self {
        Self { settings }
    }
}

impl MappingsProvider for StaticToolchain {
    fn contract_version(&self) -> u32 {
        self.settings.contract_version
    }

    fn mixin_mappings(&self) -> Vec<PathBuf> {
        self.settings.mixin_mappings.clone()
    }

    fn refmap_name(&self) -> String {
        self.settings.refmap_name.clone()
    }

    fn tiny_mappings_with_srg(&self) -> Option<PathBuf> {
        self.settings.tiny_mappings_with_srg.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_contract_version() {
        let toolchain = StaticToolchain::new(ToolchainSettings {
            contract_version: 2,
            ..ToolchainSettings::default()
        });
        assert!(matches!(
            ensure_compatible(&toolchain),
            Err(ArchitectError::ToolchainContract {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn default_settings_are_compatible() {
        let toolchain = StaticToolchain::new(ToolchainSettings::default());
        assert!(ensure_compatible(&toolchain).is_ok());
        assert_eq!(toolchain.refmap_name(), "refmap.json");
    }
}
