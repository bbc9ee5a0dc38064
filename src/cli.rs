// CLI module - command-line argument parsing and handlers
//
// Normal use is `logwall --file a.log --file b.log [--font F]`.
// Configuration management lives under the `config` subcommand:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --path: Print the config file location

use crate::config::{Config, VERSION};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Most files followed at once; extra `--file` arguments are dropped
pub const MAX_SOURCES: usize = 128;

/// logwall - follow many log files on a wall of panels
#[derive(Parser, Debug)]
#[command(name = "logwall")]
#[command(version = VERSION)]
#[command(about = "Follow up to 128 log files side by side", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// File to follow (repeatable, up to 128)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Font for panel text (ignored by the terminal renderer)
    #[arg(long, value_name = "PATH")]
    pub font: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// What `main` should do after argument handling
#[derive(Debug)]
pub enum CliOutcome {
    /// A subcommand ran; exit
    Handled,
    /// Follow these sources
    Run(RunArgs),
}

/// Validated arguments for a follow session
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Absolute, deduplicated, at most [`MAX_SOURCES`]
    pub files: Vec<PathBuf>,
    /// How many paths were dropped for exceeding the limit
    pub dropped: usize,
    pub font: Option<PathBuf>,
}

/// Parse the command line and run any subcommand
pub fn handle_cli() -> Result<CliOutcome> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { show, reset, path }) => {
            if path {
                handle_config_path()?;
            } else if show {
                handle_config_show()?;
            } else if reset {
                handle_config_reset()?;
            } else {
                // No flag provided, show help
                println!("Usage: logwall config [--show|--reset|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --path    Show config file path");
            }
            Ok(CliOutcome::Handled)
        }
        None => {
            let cwd = std::env::current_dir().context("Cannot determine working directory")?;
            Ok(CliOutcome::Run(resolve_run_args(cli.files, cli.font, &cwd)?))
        }
    }
}

/// Validate `--file` arguments
///
/// Relative paths are resolved against `cwd` (files need not exist yet).
/// Duplicates keep their first position. Beyond [`MAX_SOURCES`] the rest
/// are dropped. Zero files is an error.
pub fn resolve_run_args(files: Vec<PathBuf>, font: Option<PathBuf>, cwd: &Path) -> Result<RunArgs> {
    if files.is_empty() {
        bail!("at least one --file <PATH> is required");
    }

    let mut seen = HashSet::new();
    let mut resolved: Vec<PathBuf> = files
        .into_iter()
        .map(|p| if p.is_absolute() { p } else { cwd.join(p) })
        .filter(|p| seen.insert(p.clone()))
        .collect();

    // Reported by startup once logging is installed
    let dropped = resolved.len().saturating_sub(MAX_SOURCES);
    resolved.truncate(MAX_SOURCES);

    Ok(RunArgs {
        files: resolved,
        dropped,
        font,
    })
}

fn config_path_or_err() -> Result<PathBuf> {
    Config::config_path().context("Could not determine config path")
}

fn handle_config_path() -> Result<()> {
    println!("{}", config_path_or_err()?.display());
    Ok(())
}

fn handle_config_show() -> Result<()> {
    let config = Config::from_env()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    // Show source info
    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_config_reset() -> Result<()> {
    let path = config_path_or_err()?;

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    Config::write_template(&path)
        .with_context(|| format!("Error writing config to {}", path.display()))?;

    println!("Config reset to defaults: {}", path.display());
    Ok(())
}
