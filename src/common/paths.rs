//! Default configuration and log locations
//!
//! Files are looked up in the working directory first, then in the
//! platform configuration directory.

use std::io;
use std::path::{Path, PathBuf};

/// Name used for the configuration directory
const APP_NAME: &str = "lb-probe";

/// Runner configuration file name
pub const CONFIG_FILE: &str = "config.toml";

/// Credentials file name
pub const CREDENTIALS_FILE: &str = "credentials.toml";

/// Test case definitions file name
pub const TEST_CASES_FILE: &str = "test_cases.yaml";

/// Log file name inside the log directory
pub const LOG_FILE: &str = "test_execution.log";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/lb-probe/`
/// - macOS: `~/Library/Application Support/lb-probe/`
/// - Windows: `%APPDATA%\lb-probe\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Resolve a file by name: `./<name>` if present, else `<config_dir>/<name>`
///
/// Falls back to the working-directory path when neither exists so that
/// error messages point at the most likely location.
pub fn resolve(name: &str) -> PathBuf {
    let local = PathBuf::from(name);
    if local.exists() {
        return local;
    }
    match config_dir().map(|dir| dir.join(name)) {
        Some(path) if path.exists() => path,
        _ => local,
    }
}

/// Ensure a directory exists, creating it if needed
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
