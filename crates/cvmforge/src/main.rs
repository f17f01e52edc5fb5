mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cvmforge")]
#[command(version, about = "Build Tencent Cloud CVM images", long_about = None)]
struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a build: launch, capture, share and copy an image
    Build {
        /// Build file (.yaml, .yml or .json)
        file: PathBuf,
    },
    /// Check a build file without calling the cloud
    Validate {
        /// Build file (.yaml, .yml or .json)
        file: PathBuf,
    },
    /// Image queries
    #[command(subcommand)]
    Image(ImageCommands),
    /// Show which credentials and region would be used
    Whoami {
        /// Profile name (TENCENTCLOUD_PROFILE)
        #[arg(long)]
        profile: Option<String>,
        /// Region (TENCENTCLOUD_REGION)
        #[arg(long)]
        region: Option<String>,
    },
}

#[derive(Subcommand)]
enum ImageCommands {
    /// Resolve the build file's source_image_filter to one image
    Find {
        /// Build file (.yaml, .yml or .json)
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { file } => commands::build::handle(&file).await,
        Commands::Validate { file } => commands::validate::handle(&file),
        Commands::Image(ImageCommands::Find { file }) => commands::image::handle_find(&file).await,
        Commands::Whoami { profile, region } => commands::whoami::handle(profile, region).await,
    }
}
