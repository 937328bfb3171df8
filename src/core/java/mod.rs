mod runtime;

pub use runtime::{find_java_binary, format_command_for_logs, java_exe, locate_java_binary};
