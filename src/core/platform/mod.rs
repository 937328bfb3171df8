mod registry;
mod step;

pub(crate) use registry::{add_injectables_classpath, ensure_transformer_classpath};
pub use registry::{TransformPlan, TransformPlanBuilder, TransformRegistration};
pub use step::{TransformStep, TRANSFORMERS_PACKAGE};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ArchitectError;

/// The two supported mod-loading targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Fabric,
    Forge,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Fabric, Platform::Forge];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Fabric => "fabric",
            Platform::Forge => "forge",
        }
    }

    /// `Fabric` / `Forge`, used to derive configuration and task names.
    pub fn capitalized(self) -> &'static str {
        match self {
            Platform::Fabric => "Fabric",
            Platform::Forge => "Forge",
        }
    }

    /// Configuration holding the classpath entries transformed at dev runtime.
    pub fn development_configuration(self) -> String {
        format!("development{}", self.capitalized())
    }

    /// Name shared by the production configuration and its packaging task.
    pub fn production_name(self) -> String {
        format!("transformProduction{}", self.capitalized())
    }

    /// Built-in, ordered transformation steps for this platform.
    pub fn builtin_steps(self) -> &'static [TransformStep] {
        match self {
            Platform::Fabric => &step::FABRIC_STEPS,
            Platform::Forge => &step::FORGE_STEPS,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = ArchitectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fabric" => Ok(Platform::Fabric),
            "forge" => Ok(Platform::Forge),
            _ => Err(ArchitectError::UnknownPlatform(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Fabric".parse::<Platform>().unwrap(), Platform::Fabric);
        assert_eq!(" forge ".parse::<Platform>().unwrap(), Platform::Forge);
        assert!(matches!(
            "quilt".parse::<Platform>(),
            Err(ArchitectError::UnknownPlatform(name)) if name == "quilt"
        ));
    }

    #[test]
    fn derived_names() {
        assert_eq!(Platform::Fabric.development_configuration(), "developmentFabric");
        assert_eq!(Platform::Forge.production_name(), "transformProductionForge");
    }
}
