//! panes: pseudo-3D pane carousel, slider and field showcase.
//!
//! `panes view` opens the showcase in a GPU-rendered window (vello/wgpu),
//! `panes simulate` runs it headless and prints one JSON frame per line, and
//! `panes config` prints the default motion tuning.

mod paint;
mod showcase;
mod simulate;
mod viewer;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use panes::config_watcher;
use panes::{MotionConfig, logging, paths};

#[derive(Parser, Debug)]
#[command(name = "panes", version, about = "Pseudo-3D pane showcase")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the showcase in a window (the default)
    View {
        /// Start in windowed mode instead of fullscreen
        #[arg(short, long)]
        windowed: bool,

        /// Motion tuning file; watched for changes while running
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run the showcase headless and print per-frame JSON snapshots
    Simulate {
        /// Number of frames to run
        #[arg(short = 'n', long, default_value_t = 600)]
        frames: usize,

        /// Simulated frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Motion tuning file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default motion tuning as TOML
    Config,
}

fn main() -> Result<()> {
    let _log_guard = logging::init();
    let args = Args::parse();

    match args.command.unwrap_or(Command::View {
        windowed: false,
        config: None,
    }) {
        Command::View { windowed, config } => {
            let path = config.unwrap_or_else(paths::motion_config_path);
            info!(target: "config", "motion config at {}", path.display());
            viewer::run(windowed, path)
        }
        Command::Simulate { frames, fps, config } => {
            let config = match config {
                Some(path) => MotionConfig::load(&path)?,
                None => MotionConfig::load_or_default(&paths::motion_config_path()),
            };
            simulate::run(frames, fps, config)
        }
        Command::Config => {
            print!("{}", config_watcher::default_config_content());
            Ok(())
        }
    }
}
