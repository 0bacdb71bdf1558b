use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "appforge", version, about)]
pub struct Args {
    /// Path to config.toml (overrides the platform default)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the Flutter project tree from an application snapshot
    Generate {
        /// Application snapshot (JSON)
        snapshot: PathBuf,

        /// Output directory root (overrides config)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also write the packed project archive to this path
        #[arg(long)]
        archive: Option<PathBuf>,
    },

    /// Generate, pack, and submit the project to the build server
    Build {
        /// Application snapshot (JSON)
        snapshot: PathBuf,

        /// Submit without waiting for the build to finish
        #[arg(long, default_value_t = false)]
        no_wait: bool,
    },
}
