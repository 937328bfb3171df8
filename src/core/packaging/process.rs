use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::{debug, info};

use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::java::format_command_for_logs;
use crate::core::launch::join_classpath;
use crate::core::platform::TransformStep;
use crate::core::runtime::RuntimeProperties;

/// Command line entry point of the transformer distribution.
pub const TRANSFORMER_CLI_MAIN: &str = "dev.architectury.transformer.TransformerCli";

/// Runs the bytecode transformer over one archive.
pub trait ExternalTransformer {
    fn transform(
        &self,
        input: &Path,
        output: &Path,
        steps: &[TransformStep],
        properties: &RuntimeProperties,
    ) -> ArchitectResult<()>;
}

/// Spawns `java -cp <classpath> -D<k>=<v>... TransformerCli <input> <output> <steps...>`.
#[derive(Debug, Clone)]
pub struct JavaTransformerProcess {
    java: PathBuf,
    classpath: Vec<PathBuf>,
}

impl JavaTransformerProcess {
    pub fn new(java: PathBuf, classpath: Vec<PathBuf>) -> Self {
        Self { java, classpath }
    }

    pub fn command(
        &self,
        input: &Path,
        output: &Path,
        steps: &[TransformStep],
        properties: &RuntimeProperties,
    ) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.arg("-cp").arg(join_classpath(&self.classpath));
        for (key, value) in properties.iter() {
            cmd.arg(format!("-D{}={}", key, value));
        }
        cmd.arg(TRANSFORMER_CLI_MAIN).arg(input).arg(output);
        for step in steps {
            cmd.arg(step.class_name());
        }
        cmd
    }
}

impl ExternalTransformer for JavaTransformerProcess {
    fn transform(
        &self,
        input: &Path,
        output: &Path,
        steps: &[TransformStep],
        properties: &RuntimeProperties,
    ) -> ArchitectResult<()> {
        if self.classpath.is_empty() {
            return Err(ArchitectError::JavaExecution(
                "empty transformer classpath".into(),
            ));
        }

        let mut cmd = self.command(input, output, steps, properties);
        cmd.stdout(Stdio::inherit()).stderr(Stdio::piped());
        debug!("Command (copy/paste): {}", format_command_for_logs(&cmd));

        info!("transforming {:?} with {} step(s)", input, steps.len());
        let result = cmd
            .output()
            .map_err(|e| ArchitectError::JavaExecution(e.to_string()))?;
        check_exit(output, &result)
    }
}

fn check_exit(output: &Path, result: &Output) -> ArchitectResult<()> {
    if result.status.success() {
        return Ok(());
    }
    Err(ArchitectError::TransformerFailed {
        output: output.to_path_buf(),
        status: result.status.to_string(),
        stderr: String::from_utf8_lossy(&result.stderr).trim_end().to_string(),
    })
}
