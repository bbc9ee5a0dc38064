//! Configuration for the log wall
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/logwall/config.toml)
//! 3. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod logging;
mod sections;
mod serialization;


pub use logging::{FileLogging, LogRotation, LoggingConfig};
pub use sections::{
    CameraConfig, FileCamera, FileLayout, FileTail, FileUi, LayoutConfig, TailConfig, UiConfig,
};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment overrides
pub const ENV_POLL_MS: &str = "LOGWALL_POLL_MS";
pub const ENV_MAX_LINES: &str = "LOGWALL_MAX_LINES";
pub const ENV_LOG_LEVEL: &str = "LOGWALL_LOG_LEVEL";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Follower polling and panel capacity
    pub tail: TailConfig,

    /// Panel row geometry
    pub layout: LayoutConfig,

    /// Focus framing, zoom and smoothing
    pub camera: CameraConfig,

    /// Terminal UI cadence
    pub ui: UiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Values replaced while loading, reported once logging is up
    pub repairs: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure; every section is optional
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub tail: Option<FileTail>,
    pub layout: Option<FileLayout>,
    pub camera: Option<FileCamera>,
    pub ui: Option<FileUi>,
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/logwall/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("logwall").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        // Config is optional: failures here are not worth aborting for
        if let Err(e) = Self::write_template(&path) {
            tracing::debug!("Could not write default config to {}: {}", path.display(), e);
        }
    }

    /// Write the default template to `path`, creating parent directories
    pub fn write_template(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Config::default().to_toml() is the single source of truth
        std::fs::write(path, Self::default().to_toml())
    }

    /// Parse a config file; a missing file yields defaults
    ///
    /// A file that exists but cannot be read or parsed is an error. A broken
    /// config should fail fast rather than silently fall back to defaults
    /// while the user debugs the wrong thing.
    fn load_file_config(path: &Path) -> Result<FileConfig> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(e)
                .with_context(|| format!("Cannot read config file {}", path.display())),
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Result<Self> {
        let file = match Self::config_path() {
            Some(path) => Self::load_file_config(&path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(file, |key| std::env::var(key).ok()))
    }

    /// Combine file sections with environment overrides
    pub(crate) fn merge(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut tail = TailConfig::from_file(file.tail);
        let mut repairs = Vec::new();
        let mut logging = LoggingConfig::from_file(file.logging, &mut repairs);

        // Poll interval: env > file > default
        if let Some(ms) = env(ENV_POLL_MS).and_then(|v| v.trim().parse().ok()) {
            tail.poll_interval_ms = ms;
        }

        // Panel capacity: env > file > default
        if let Some(lines) = env(ENV_MAX_LINES).and_then(|v| v.trim().parse().ok()) {
            tail.panel_max_lines = lines;
        }

        // Log level: env > file > default (RUST_LOG still wins at subscriber init)
        if let Some(level) = env(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            logging.level = level.trim().to_string();
        }

        Self {
            tail: tail.sanitized(&mut repairs),
            layout: LayoutConfig::from_file(file.layout),
            camera: CameraConfig::from_file(file.camera).sanitized(&mut repairs),
            ui: UiConfig::from_file(file.ui),
            logging: logging.sanitized(&mut repairs),
            repairs,
        }
    }

    /// Log every repair made while loading
    ///
    /// Call after the subscriber is installed, or the warnings go nowhere.
    pub fn report_repairs(&self) {
        for repair in &self.repairs {
            tracing::warn!("Config: {}", repair);
        }
    }
}
