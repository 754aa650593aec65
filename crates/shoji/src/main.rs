//! Shoji CLI - build-time web component static site builder.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "shoji")]
#[command(about = "Build-time web component static site builder")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to site.toml config file
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the static site
    Build {
        /// Output directory (defaults to config or "docs")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base URL for rendered links (defaults to $BASE_URL, config, or "/")
        #[arg(short, long)]
        base_url: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Build { output, base_url } => {
            commands::build::run(&cli.config, output, base_url)?;
        }
    }

    Ok(())
}
