//! inlay CLI - YAML-and-template static site generator and server.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;
mod site;

#[derive(Parser)]
#[command(name = "inlay")]
#[command(about = "YAML-and-template static site generator and server")]
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
        /// Output directory (defaults to config or "_site")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the site dynamically, rendering per request
    Serve {
        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open a browser on start
        #[arg(long)]
        open: bool,
    },

    /// Preview a built site
    Preview {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve
        #[arg(short, long, default_value = "_site")]
        dir: PathBuf,
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

    // Execute command
    match cli.command {
        Commands::Build { output } => {
            commands::build::run(cli.config, output).await?;
        }
        Commands::Serve { port, open } => {
            commands::serve::run(cli.config, port, open).await?;
        }
        Commands::Preview { port, dir } => {
            commands::preview::run(port, dir).await?;
        }
    }

    Ok(())
}
