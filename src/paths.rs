//! Application directories for panes.
//!
//! - Config: `$XDG_CONFIG_HOME/panes/` or `~/.config/panes/` (human-editable,
//!   also on macOS so `motion.toml` is easy to find from a terminal)
//! - Logs:   `~/Library/Logs/panes/` on macOS, else
//!   `$XDG_DATA_HOME/panes/logs/` or `~/.local/share/panes/logs/`

use std::path::{Path, PathBuf};

use tracing::info;

const APP_NAME: &str = "panes";
pub const MOTION_FILE: &str = "motion.toml";

#[derive(Debug, Clone)]
pub struct PanesPaths {
    pub config: PathBuf,
    pub logs: PathBuf,
}

impl PanesPaths {
    /// Resolve from the environment. Does not touch the filesystem.
    pub fn resolve() -> Option<Self> {
        let home = std::env::var("HOME").ok().map(PathBuf::from)?;
        Some(Self {
            config: resolve_config_dir(&home),
            logs: resolve_log_dir(&home),
        })
    }

    pub fn motion_config(&self) -> PathBuf {
        self.config.join(MOTION_FILE)
    }

    /// Create any missing directories.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [&self.config, &self.logs] {
            std::fs::create_dir_all(dir)?;
            info!("ensured directory: {}", dir.display());
        }
        Ok(())
    }
}

/// `motion.toml` under the resolved config directory, falling back to
/// `/tmp/panes` without `$HOME`.
pub fn motion_config_path() -> PathBuf {
    match PanesPaths::resolve() {
        Some(paths) => paths.motion_config(),
        None => PathBuf::from("/tmp").join(APP_NAME).join(MOTION_FILE),
    }
}

pub fn log_dir() -> Option<PathBuf> {
    PanesPaths::resolve().map(|p| p.logs)
}

fn resolve_config_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join(APP_NAME)
    } else {
        home.join(".config").join(APP_NAME)
    }
}

#[cfg(target_os = "macos")]
fn resolve_log_dir(home: &Path) -> PathBuf {
    home.join("Library").join("Logs").join(APP_NAME)
}

#[cfg(not(target_os = "macos"))]
fn resolve_log_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join(APP_NAME).join("logs")
    } else {
        home.join(".local").join("share").join(APP_NAME).join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_config_lives_in_config_dir() {
        let path = motion_config_path();
        assert!(path.ends_with("panes/motion.toml"), "got {}", path.display());
    }

    #[test]
    fn ensure_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = PanesPaths {
            config: tmp.path().join("config"),
            logs: tmp.path().join("data/logs"),
        };

        paths.ensure().unwrap();

        assert!(paths.config.is_dir());
        assert!(paths.logs.is_dir());
        assert_eq!(paths.motion_config(), tmp.path().join("config/motion.toml"));
    }
}
