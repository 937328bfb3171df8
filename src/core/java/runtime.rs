use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{ArchitectError, ArchitectResult};

pub fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// `bin/java` under a JDK home, also accepting the macOS bundle layout.
pub fn locate_java_binary(java_home: &Path) -> Option<PathBuf> {
    let primary = java_home.join("bin").join(java_exe());
    if primary.is_file() {
        return Some(primary);
    }

    let mac_layout = java_home
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(java_exe());
    mac_layout.is_file().then_some(mac_layout)
}

/// The JVM used to run the external transformer.
///
/// `JAVA_HOME` wins, then the first `java` on `PATH`.
pub fn find_java_binary() -> ArchitectResult<PathBuf> {
    if let Some(home) = std::env::var_os("JAVA_HOME").filter(|h| !h.is_empty()) {
        let home = PathBuf::from(home);
        if let Some(java) = locate_java_binary(&home) {
            debug!("using java from JAVA_HOME: {:?}", java);
            return Ok(java);
        }
        debug!("JAVA_HOME {:?} has no {}", home, java_exe());
    }

    let path = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path)
        .map(|dir| dir.join(java_exe()))
        .find(|candidate| candidate.is_file())
        .map(|java| {
            debug!("using java from PATH: {:?}", java);
            java
        })
        .ok_or_else(|| {
            ArchitectError::JavaExecution(
                "no Java runtime found; set JAVA_HOME or put java on PATH".into(),
            )
        })
}

/// A copy/paste friendly rendering of a command line.
pub fn format_command_for_logs(cmd: &std::process::Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | '|')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
