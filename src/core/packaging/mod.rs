// ─── Production packaging ───
// Wires the `common` project's archive tasks and produces the per-platform
// transformed jars through the external transformer.

mod packager;
mod process;

pub use packager::{CommonSetup, ProductionPackager, COMMON_MARKER};
pub use process::{ExternalTransformer, JavaTransformerProcess, TRANSFORMER_CLI_MAIN};
