//! Hot reload for `motion.toml`.
//!
//! The watcher observes the file's *parent directory* and filters by file
//! name: editors that save via write-to-temp-then-rename never modify the
//! watched inode itself.
//!
//! The callback runs on the watcher's thread. Hosts usually forward the new
//! text over a channel and apply it between frames with `Stage::reconfigure`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::config::MotionConfig;

/// Write the default config to `path` unless something is already there.
pub fn ensure_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, default_config_content()).with_context(|| format!("writing {}", path.display()))?;
    info!(target: "config", "wrote default motion config to {}", path.display());
    Ok(())
}

/// Commented header followed by every default value.
pub fn default_config_content() -> String {
    format!(
        "# Motion tuning for panes. Edit and save; running viewers reload it.\n\
         # Missing keys use compiled defaults. Delete a line to reset it.\n\n{}",
        MotionConfig::default().to_toml()
    )
}

/// Call `on_change` whenever the file at `path` is created or modified.
pub fn spawn_watcher<F>(path: &Path, on_change: F) -> Result<RecommendedWatcher>
where
    F: Fn() + Send + 'static,
{
    let target = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?
        .to_os_string();
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?
        .to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            if event.paths.iter().any(|p| p.file_name() == Some(target.as_os_str())) {
                on_change();
            }
        }
        Err(e) => warn!(target: "config", "watch error: {e}"),
    })?;

    watcher
        .watch(&parent, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {}", parent.display()))?;
    Ok(watcher)
}

/// Keeps the watcher alive; dropping it stops reloads.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Ensure `path` exists, then hand its parsed contents to `on_reload`
    /// after every save. Unparseable saves are logged and skipped.
    pub fn start<F>(path: PathBuf, on_reload: F) -> Result<Self>
    where
        F: Fn(MotionConfig) + Send + 'static,
    {
        ensure_default_config(&path)?;

        let watched = path.clone();
        let watcher = spawn_watcher(&path, move || match MotionConfig::load(&watched) {
            Ok(config) => on_reload(config),
            Err(e) => warn!(target: "config", "ignoring motion config change: {e:#}"),
        })?;

        info!(target: "config", "watching {}", path.display());
        Ok(Self { _watcher: watcher, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
