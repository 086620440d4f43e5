//! Path resolution for choreo
//!
//! # Config file lookup
//!
//! 1. `--config <path>` (or the `CHOREO_CONFIG` environment variable, read by clap)
//! 2. `XDG_CONFIG_HOME/choreo/choreo.toml` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\choreo\choreo.toml`
//!    - macOS/Linux: `~/.config/choreo/choreo.toml`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable holding the config file path
pub const ENV_CONFIG: &str = "CHOREO_CONFIG";

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "choreo.toml";

/// Get the choreo config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("choreo");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("choreo");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("choreo");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Resolve the config file to load
///
/// An explicit path wins and is expanded; otherwise the file lives in
/// [`config_dir`].
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => {
            let path = expand(&path.to_string_lossy());
            log::debug!("Using config file: {}", path.display());
            Ok(path)
        }
        None => Ok(config_dir()?.join(CONFIG_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables leave the string untouched.
///
/// # Examples
///
/// ```ignore
/// let path = paths::expand("~/.config/nginx");
/// let path = paths::expand("$HOME/.config/nginx");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
