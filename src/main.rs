//! architect CLI
//!
//! Configures the hand-off between a mod project and the Architectury
//! transformer: runtime files for development runs and production jars.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use architect_lib::commands;
use architect_lib::core::error::{ArchitectError, ArchitectResult};
use architect_lib::core::platform::Platform;
use architect_lib::core::project::ProjectContext;

#[derive(Parser)]
#[command(name = "architect")]
#[command(about = "Architectury transformer hand-off for Fabric and Forge projects")]
#[command(version)]
struct Cli {
    /// Project directory (default: current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default architectury.json
    Init {
        /// Platforms `prepare` registers by default
        #[arg(long, value_delimiter = ',')]
        platforms: Vec<Platform>,
    },

    /// Register platforms, write runtime files and patch run configurations
    Prepare {
        /// Platforms to register (default: from settings)
        #[arg(long, value_delimiter = ',')]
        platforms: Vec<Platform>,

        /// Also mark run configurations for IDE generation
        #[arg(long)]
        ide: bool,
    },

    /// Configure common packaging and create placeholder production jars
    Common {
        /// Override the Forge setting from architectury.json
        #[arg(long)]
        forge_enabled: Option<bool>,
    },

    /// Build the transformProduction jar for one platform
    TransformProduction {
        platform: Platform,

        /// Input jar (default: the dev jar)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output jar (default: the transformProduction<Platform> archive)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add the common marker to a jar (default: the remapJar output)
    MarkCommon { archive: Option<PathBuf> },

    /// Name the refmap in a jar's or directory's mixin configs
    AddRefmap {
        target: PathBuf,

        /// Refmap file name (default: the project's toolchain setting)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List the transform steps for a platform
    Steps { platform: Platform },

    /// Download transformer artifacts into the managed repository
    Fetch,
}

#[tokio::main]
async fn main() -> ExitCode {
    architect_lib::init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ArchitectResult<()> {
    let project = match cli.project {
        Some(project) => project,
        None => std::env::current_dir().map_err(|e| ArchitectError::io(".", e))?,
    };

    match cli.command {
        Commands::Init { platforms } => {
            let path = commands::init(&project, &platforms)?;
            print_json(&path)
        }
        Commands::Prepare { platforms, ide } => {
            print_json(&commands::prepare(&project, &platforms, ide)?)
        }
        Commands::Common { forge_enabled } => print_json(&commands::common(&project, forge_enabled)?),
        Commands::TransformProduction {
            platform,
            input,
            output,
        } => print_json(&commands::transform_production(
            &project, platform, input, output,
        )?),
        Commands::MarkCommon { archive } => {
            print_json(&commands::mark_common(&project, archive)?)
        }
        Commands::AddRefmap { target, name } => {
            let name = match name {
                Some(name) => name,
                None => commands::project_refmap_name(&project)?.ok_or_else(|| {
                    ArchitectError::Other(
                        "no refmap name given and the project has no toolchain".into(),
                    )
                })?,
            };
            print_json(&commands::add_refmap(&target, &name)?)
        }
        Commands::Steps { platform } => {
            let settings = ProjectContext::load(&project)
                .map(|ctx| ctx.settings)
                .unwrap_or_default();
            print_json(&commands::steps(&settings, platform))
        }
        Commands::Fetch => print_json(&commands::fetch(&project).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> ArchitectResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
