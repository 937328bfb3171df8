use serde::{Deserialize, Serialize};
use std::fmt;

/// Package holding the transformer's built-in step classes.
pub const TRANSFORMERS_PACKAGE: &str = "dev.architectury.transformer.transformers";

/// One named behaviour applied by the external transformer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformStep {
    RuntimeMixinRefmapDetector,
    GenerateFakeFabricMod,
    GenerateFakeForgeMod,
    TransformExpectPlatform,
    RemapInjectables,
    TransformPlatformOnly,
    TransformForgeAnnotations,
    TransformForgeEnvironment,
    FixForgeMixin,
    /// Any other transformer, by fully-qualified class name.
    Custom(String),
}

pub(super) static FABRIC_STEPS: [TransformStep; 5] = [
    TransformStep::RuntimeMixinRefmapDetector,
    TransformStep::GenerateFakeFabricMod,
    TransformStep::TransformExpectPlatform,
    TransformStep::RemapInjectables,
    TransformStep::TransformPlatformOnly,
];

// Platform fix-ups run after the shared rewriting steps.
pub(super) static FORGE_STEPS: [TransformStep; 8] = [
    TransformStep::RuntimeMixinRefmapDetector,
    TransformStep::TransformExpectPlatform,
    TransformStep::RemapInjectables,
    TransformStep::TransformPlatformOnly,
    TransformStep::TransformForgeAnnotations,
    TransformStep::TransformForgeEnvironment,
    TransformStep::GenerateFakeForgeMod,
    TransformStep::FixForgeMixin,
];

impl TransformStep {
    /// Short identifier, e.g. `detect-refmap`.
    pub fn id(&self) -> &str {
        match self {
            TransformStep::RuntimeMixinRefmapDetector => "detect-refmap",
            TransformStep::GenerateFakeFabricMod | TransformStep::GenerateFakeForgeMod => {
                "generate-fake-mod"
            }
            TransformStep::TransformExpectPlatform => "remap-expect-platform",
            TransformStep::RemapInjectables => "remap-injectables",
            TransformStep::TransformPlatformOnly => "strip-platform-only",
            TransformStep::TransformForgeAnnotations => "fix-forge-annotations",
            TransformStep::TransformForgeEnvironment => "fix-forge-environment",
            TransformStep::FixForgeMixin => "fix-forge-mixin",
            TransformStep::Custom(class_name) => class_name,
        }
    }

    /// Fully-qualified transformer class consumed by the runtime manifest.
    pub fn class_name(&self) -> String {
        let simple = match self {
            TransformStep::RuntimeMixinRefmapDetector => "RuntimeMixinRefmapDetector",
            TransformStep::GenerateFakeFabricMod => "GenerateFakeFabricMod",
            TransformStep::GenerateFakeForgeMod => "GenerateFakeForgeMod",
            TransformStep::TransformExpectPlatform => "TransformExpectPlatform",
            TransformStep::RemapInjectables => "RemapInjectables",
            TransformStep::TransformPlatformOnly => "TransformPlatformOnly",
            TransformStep::TransformForgeAnnotations => "TransformForgeAnnotations",
            TransformStep::TransformForgeEnvironment => "TransformForgeEnvironment",
            TransformStep::FixForgeMixin => "FixForgeMixin",
            TransformStep::Custom(class_name) => return class_name.clone(),
        };
        format!("{}.{}", TRANSFORMERS_PACKAGE, simple)
    }

    /// Inverse of [`class_name`](Self::class_name); unknown classes become `Custom`.
    pub fn from_class_name(class_name: &str) -> Self {
        FORGE_STEPS
            .iter()
            .chain(FABRIC_STEPS.iter())
            .find(|step| step.class_name() == class_name)
            .cloned()
            .unwrap_or_else(|| TransformStep::Custom(class_name.to_string()))
    }
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
