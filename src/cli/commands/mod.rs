//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod process;
mod serve;
mod split;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{BackendKind, Settings};

#[derive(Parser)]
#[command(name = "rubricly")]
#[command(about = "Extract rubric scores from scanned evaluation PDFs")]
#[command(version)]
pub struct Cli {
    /// Config file path (default: a discovered rubricly config file)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extraction backend (overrides RUBRICLY_BACKEND and the config file)
    #[arg(short, long, global = true, value_enum)]
    backend: Option<BackendKind>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:8000)
        #[arg(default_value = "127.0.0.1:8000")]
        bind: String,
    },

    /// Extract scores from a PDF and print a summary
    Process {
        /// PDF containing one or more 3-page rubrics
        file: PathBuf,

        /// Write the scores as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Split a PDF into per-rubric chunk files
    Split {
        /// PDF to split
        file: PathBuf,

        /// Output directory for chunk PDFs
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Show configuration and check the extraction backend
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).await?;
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(settings, &bind).await,
        Commands::Process { file, csv, json } => {
            process::cmd_process(&settings, &file, csv.as_deref(), json).await
        }
        Commands::Split { file, out } => split::cmd_split(&file, &out),
        Commands::Check => check::cmd_check(&settings),
    }
}
