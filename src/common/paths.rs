//! Configuration and capture paths
//!
//! Uses the directories crate for platform-appropriate locations.

use std::path::{Path, PathBuf};

/// Application name used for config and data directories
const APP_NAME: &str = "filtertest";

/// Get the configuration directory path
///
/// - Linux: `~/.config/filtertest/`
/// - macOS: `~/Library/Application Support/filtertest/`
/// - Windows: `%APPDATA%\filtertest\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve a capture path from a plan against the capture root.
///
/// Absolute paths are kept as they are.
pub fn resolve_capture(root: &Path, pcap_path: &str) -> PathBuf {
    let path = Path::new(pcap_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
