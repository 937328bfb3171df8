pub mod classpath;
mod patcher;
mod run_config;

pub use classpath::{get_classpath_separator, join_classpath, safe_path_str};
pub use patcher::{escape_spaces, setup_ide_runs, LaunchConfigPatcher, TRANSFORMER_RUNTIME_MAIN};
pub use run_config::{RunConfig, RunConfigStore};
