//! horcrux CLI
//!
//! Splits a file into encrypted shards and binds them back together.
//!
//! ## Usage
//!
//! ```bash
//! # 5 shards, any 3 restore the file
//! horcrux split diary.txt -n 5 -t 3
//!
//! # bind every *.horcrux in the current directory
//! horcrux bind
//!
//! # bind into an explicit path, replacing it if present
//! horcrux bind ./shards -o restored.txt --force
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use horcrux::{find_shards, ShareSet, SplitConfig};

#[derive(Parser)]
#[command(name = "horcrux")]
#[command(about = "split a file into encrypted horcruxes, any threshold of which restore it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into horcruxes
    Split {
        /// File to split
        file: PathBuf,

        /// Number of horcruxes to create (2-255)
        #[arg(short = 'n', long, env = "HORCRUX_TOTAL")]
        total: usize,

        /// Number of horcruxes required to restore the file
        #[arg(short = 't', long, env = "HORCRUX_THRESHOLD")]
        threshold: usize,

        /// Directory for the horcruxes (default: next to the file)
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },

    /// Bind horcruxes found in a directory back into the original file
    Bind {
        /// Directory to search for *.horcrux files
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output path (default: original file name inside the directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace the output file if it already exists
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("horcrux={}", level).into()),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Split {
            file,
            total,
            threshold,
            destination,
        } => run_split(file, total, threshold, destination),
        Commands::Bind { dir, output, force } => run_bind(dir, output, force),
    }
}

fn run_split(
    file: PathBuf,
    total: usize,
    threshold: usize,
    destination: Option<PathBuf>,
) -> Result<()> {
    let config = SplitConfig::new(total, threshold)?;
    let destination = destination.unwrap_or_else(|| match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    });

    let paths = horcrux::split(&file, &destination, &config)
        .with_context(|| format!("failed to split {}", file.display()))?;

    info!("done, created {} horcruxes", paths.len());
    Ok(())
}

fn run_bind(dir: PathBuf, output: Option<PathBuf>, force: bool) -> Result<()> {
    let paths = find_shards(&dir)
        .with_context(|| format!("failed to list horcruxes in {}", dir.display()))?;
    info!("found {} horcrux files in {}", paths.len(), dir.display());

    let set = ShareSet::open(&paths)?;
    let output = output.unwrap_or_else(|| dir.join(set.original_filename()));

    match set.recover_to(&output, force) {
        Err(horcrux::Error::AlreadyExists(path)) => anyhow::bail!(
            "{} already exists, pass --output to choose another path or --force to replace it",
            path.display()
        ),
        Err(e) => {
            Err(anyhow::Error::new(e).context(format!("failed to restore {}", output.display())))
        }
        Ok(_) => {
            info!("done");
            Ok(())
        }
    }
}
