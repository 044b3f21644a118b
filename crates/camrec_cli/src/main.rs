//! camrec CLI
//!
//! Command-line tools for session recordings.
//!
//! # Commands
//!
//! - `list` - List permanent and working recordings
//! - `inspect` - Summarize one recording
//! - `verify` - Decode every recording and report malformed lines
//! - `dump` - Print the decoded packets of one recording
//! - `recover` - Finalize working files orphaned by a crash

mod commands;

use clap::{Parser, Subcommand};
use commands::{DirectionFilter, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// camrec command-line recording tools.
#[derive(Parser)]
#[command(name = "camrec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the recordings directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recordings in the directory
    List {
        /// Only show working files
        #[arg(short, long)]
        working: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Summarize one recording
    Inspect {
        /// Recording file name, or a path to it
        file: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Decode every recording and report malformed lines
    Verify {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the decoded packets of one recording
    Dump {
        /// Recording file name, or a path to it
        file: String,

        /// Maximum number of packets to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only print packets in this direction
        #[arg(short, long, value_enum)]
        direction: Option<DirectionFilter>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Finalize working files left behind by a crash or failed rename
    Recover {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = cli.path;
    match cli.command {
        Commands::List { working, format } => {
            let catalog = commands::open_catalog(path.as_deref())?;
            commands::list::run(&catalog, working, format)?;
        }
        Commands::Inspect { file, format } => {
            let (catalog, entry) = commands::resolve_file(path.as_deref(), &file)?;
            commands::inspect::run(&catalog, &entry, format)?;
        }
        Commands::Verify { format } => {
            let catalog = commands::open_catalog(path.as_deref())?;
            commands::verify::run(&catalog, format)?;
        }
        Commands::Dump {
            file,
            limit,
            direction,
            format,
        } => {
            let (catalog, entry) = commands::resolve_file(path.as_deref(), &file)?;
            commands::dump::run(&catalog, &entry, limit, direction, format)?;
        }
        Commands::Recover { dry_run } => {
            let catalog = commands::open_catalog(path.as_deref())?;
            commands::recover::run(&catalog, dry_run)?;
        }
        Commands::Version => {
            println!("camrec CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
