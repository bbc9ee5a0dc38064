//! `[logging]` section
//!
//! The level feeds the default `EnvFilter` directive (`RUST_LOG` still wins).
//! File output is opt-in; when on, JSON lines go to `file_dir` under
//! `file_prefix`, rolled per `file_rotation`.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// How often the JSON log file rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    /// One file for the life of the process
    Never,
}

impl LogRotation {
    const ALL: [LogRotation; 3] = [Self::Hourly, Self::Daily, Self::Never];

    /// Case-insensitive lookup by config name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|rotation| rotation.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error or off
    pub level: String,
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    /// Rolled files are named `<prefix>.<date>`
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs"),
            file_rotation: LogRotation::Daily,
            file_prefix: "logwall".to_string(),
        }
    }
}

/// `[logging]` as written in the file; rotation stays a string so a typo
/// becomes a repair instead of a parse error
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    pub fn from_file(file: Option<FileLogging>, repairs: &mut Vec<String>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let file_rotation = match file.file_rotation {
            None => defaults.file_rotation,
            Some(name) => LogRotation::from_name(&name).unwrap_or_else(|| {
                repairs.push(format!(
                    "logging.file_rotation {:?} unknown, using {}",
                    name,
                    defaults.file_rotation.as_str()
                ));
                defaults.file_rotation
            }),
        };

        Self {
            level: file.level.unwrap_or(defaults.level),
            file_enabled: file.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file.file_dir.map_or(defaults.file_dir, PathBuf::from),
            file_rotation,
            file_prefix: file.file_prefix.unwrap_or(defaults.file_prefix),
        }
    }

    /// An unparsable level would leave the subscriber with no usable
    /// default directive; fall back to info
    pub fn sanitized(mut self, repairs: &mut Vec<String>) -> Self {
        if self.level.parse::<LevelFilter>().is_err() {
            repairs.push(format!("logging.level {:?} unknown, using info", self.level));
            self.level = Self::default().level;
        }
        if self.file_prefix.trim().is_empty() {
            repairs.push("logging.file_prefix is empty, using logwall".to_string());
            self.file_prefix = Self::default().file_prefix;
        }
        self
    }
}
