// Startup module - banner and source list
//
// Printed to stdout before the terminal UI takes over the screen, so the user
// can see which files are being followed and which are still missing.

use crate::cli::{RunArgs, MAX_SOURCES};
use crate::config::{Config, VERSION};
use std::path::PathBuf;

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// One followed file as shown in the banner
pub struct SourceStatus {
    pub path: PathBuf,
    /// Missing files are followed once they appear
    pub exists: bool,
}

pub fn source_statuses(args: &RunArgs) -> Vec<SourceStatus> {
    args.files
        .iter()
        .map(|path| SourceStatus {
            exists: path.exists(),
            path: path.clone(),
        })
        .collect()
}

/// Plain-text summary line, also written to the log
pub fn following_line(count: usize) -> String {
    format!("[INFO] following files (count={})", count)
}

/// Print the startup banner and source list
pub fn print_startup(config: &Config, args: &RunArgs) {
    use colors::*;

    // Banner
    println!();
    println!("  {BOLD}{CYAN}logwall{RESET} {DIM}v{VERSION}{RESET}");
    println!("  {DIM}Many logs, one wall{RESET}");
    println!();

    // Config file status
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("  {DIM}Config:{RESET} {GREEN}✓{RESET} {}", path.display());
        } else {
            println!("  {DIM}Config:{RESET} {DIM}(using defaults){RESET}");
        }
    }
    println!();

    println!("  {}", following_line(args.files.len()));
    for status in source_statuses(args) {
        print_source_status(&status);
    }

    if args.dropped > 0 {
        println!(
            "  {YELLOW}▸{RESET} {YELLOW}{} more ignored{RESET} {DIM}(limit {}){RESET}",
            args.dropped, MAX_SOURCES
        );
    }
    if let Some(font) = &args.font {
        println!(
            "  {DIM}Font {} ignored: the terminal renderer uses the terminal font{RESET}",
            font.display()
        );
    }
    println!(
        "  {DIM}Polling every {} ms, {} lines per panel{RESET}",
        config.tail.poll_interval_ms, config.tail.panel_max_lines
    );
    println!();
}

fn print_source_status(status: &SourceStatus) {
    use colors::*;

    let (icon, note) = if status.exists {
        (format!("{GREEN}✓{RESET}"), "")
    } else {
        (format!("{DIM}○{RESET}"), " (waiting for file)")
    };

    println!("    {icon} {}{DIM}{note}{RESET}", status.path.display());
}

/// Mirror the banner into the log buffer
pub fn log_startup(args: &RunArgs) {
    tracing::info!("logwall v{}", VERSION);
    tracing::info!("{}", following_line(args.files.len()));
    for status in source_statuses(args) {
        if status.exists {
            tracing::debug!("  ✓ {}", status.path.display());
        } else {
            tracing::info!("  ○ {} (waiting for file)", status.path.display());
        }
    }
    if args.dropped > 0 {
        tracing::warn!("{} files over the {} limit were ignored", args.dropped, MAX_SOURCES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_following_line_format() {
        assert_eq!(following_line(3), "[INFO] following files (count=3)");
    }

    #[test]
    fn test_statuses_report_missing_files() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("here.log");
        std::fs::write(&present, "").unwrap();
        let args = RunArgs {
            files: vec![present.clone(), dir.path().join("later.log")],
            dropped: 0,
            font: None,
        };

        let statuses = source_statuses(&args);
        assert!(statuses[0].exists);
        assert!(!statuses[1].exists);
        assert_eq!(statuses[0].path, present);
    }

    #[test]
    fn test_dropped_files_are_logged_after_init() {
        use crate::logging::{LogBuffer, LogLevel, TuiLogLayer};
        use tracing_subscriber::layer::SubscriberExt;

        let args = RunArgs {
            files: vec![PathBuf::from("/var/log/a.log")],
            dropped: 4,
            font: None,
        };
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry().with(TuiLogLayer::new(buffer.clone()));
        tracing::subscriber::with_default(subscriber, || log_startup(&args));

        let latest = buffer.latest().unwrap();
        assert_eq!(latest.level, LogLevel::Warn);
        assert_eq!(
            latest.message,
            format!("4 files over the {} limit were ignored", MAX_SOURCES)
        );
    }
}
