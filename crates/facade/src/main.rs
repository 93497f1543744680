//! facade CLI - React wrappers and type declarations for custom elements.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "facade")]
#[command(about = "Generate React wrappers and type declarations for custom elements")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to facade.toml config file
    #[arg(short, long, default_value = "facade.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default facade.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the component manifest as JSON
    Manifest {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Generate the wrapper module and write declarations
    Generate {
        /// Also write the wrapper module to this file
        #[arg(short, long)]
        wrapper: Option<PathBuf>,
    },

    /// Regenerate whenever sources change
    Watch {
        /// Also write the wrapper module to this file
        #[arg(short, long)]
        wrapper: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Manifest { pretty } => {
            commands::manifest::run(&cli.config, pretty)?;
        }
        Commands::Generate { wrapper } => {
            commands::generate::run(&cli.config, wrapper).await?;
        }
        Commands::Watch { wrapper } => {
            commands::watch::run(&cli.config, wrapper).await?;
        }
    }

    Ok(())
}
