use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::engine::EngineConfig;

/// Terminals narrower than this get on-screen touch buttons.
pub const TOUCH_WIDTH_THRESHOLD: u16 = 60;

#[derive(Parser, Debug)]
#[command(name = "pixel-journey", about = "A life story as a side-scrolling platformer", version)]
pub struct Args {
    /// Directory holding level_*.toml files
    #[arg(long, env = "PIXEL_JOURNEY_LEVELS", default_value = "levels")]
    pub levels: PathBuf,

    /// Root that asset references resolve against
    #[arg(long, env = "PIXEL_JOURNEY_ASSETS", default_value = "assets")]
    pub assets: PathBuf,

    /// Where the current level index is saved
    #[arg(long, env = "PIXEL_JOURNEY_SAVE_FILE", default_value = ".pixel-journey/progress")]
    pub save_file: PathBuf,

    /// Keep progress in memory only
    #[arg(long)]
    pub no_save: bool,

    /// Optional TOML file tuning the engine and audio
    #[arg(long, env = "PIXEL_JOURNEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output (the terminal is busy drawing the game)
    #[arg(long, env = "PIXEL_JOURNEY_LOG_FILE", default_value = "pixel-journey.log")]
    pub log_file: PathBuf,

    /// Always show on-screen touch buttons
    #[arg(long, conflicts_with = "keyboard")]
    pub touch: bool,

    /// Never show on-screen touch buttons
    #[arg(long)]
    pub keyboard: bool,

    /// Disable soundtracks
    #[arg(long)]
    pub mute: bool,
}

impl Args {
    /// Touch controls on request, or on narrow terminals unless the
    /// keyboard is forced.
    pub fn use_touch(&self, terminal_width: u16) -> bool {
        self.touch || (!self.keyboard && terminal_width < TOUCH_WIDTH_THRESHOLD)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub audio: AudioSettings,
    pub input: InputSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub mute: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// How long a key counts as held without repeats, on terminals that
    /// cannot report releases.
    pub hold_timeout_ms: u64,
    pub frame_ms: u64,
}

impl Default for InputSettings {
    fn default() -> Self {
        InputSettings {
            hold_timeout_ms: 700,
            frame_ms: 16,
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Settings::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
