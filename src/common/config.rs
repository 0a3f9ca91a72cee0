//! Configuration file handling

use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Plan execution settings
    #[serde(default)]
    pub run: RunConfig,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Plan execution settings
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// Number of cases executed at once
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Per-case timeout in seconds, 0 disables it
    #[serde(default = "default_case_timeout")]
    pub case_timeout_secs: u64,

    /// Default capture root when none is given on the command line
    #[serde(default)]
    pub capture_root: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            case_timeout_secs: default_case_timeout(),
            capture_root: None,
        }
    }
}

fn default_jobs() -> usize {
    1
}
fn default_case_timeout() -> u64 {
    60
}

/// Report format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// One `tc id` line per case plus an aggregate line
    #[default]
    Text,
    /// A single JSON document with every verdict
    Json,
}

/// When to colorize the text report
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Colorize when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

/// Report output settings
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: ReportFormat,

    #[serde(default)]
    pub color: ColorMode,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        if config.run.jobs == 0 {
            return Err(super::Error::Config(
                "run.jobs must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}
