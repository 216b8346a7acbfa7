//! Optional TOML configuration file.
//!
//! ```toml
//! rom_dir = "/home/me/roms"
//! machine = "mtx512"
//! frames = 500
//!
//! [board]
//! daisy_order = ["ctc", "dart"]
//! ram_pages = 4
//! ```
//!
//! Command-line arguments override everything here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use mtx_machines::MtxDevice;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rom_dir: Option<PathBuf>,
    pub machine: Option<String>,
    pub frames: Option<u64>,
    #[serde(default)]
    pub board: BoardSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BoardSection {
    pub daisy_order: Option<Vec<MtxDevice>>,
    pub ram_pages: Option<usize>,
}

/// `<config dir>/mtx/config.toml`, if the platform has a config directory.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mtx").join("config.toml"))
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read an explicitly named file; it must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Read the file at the default location, or defaults if there is none.
    pub fn load_default() -> Result<Self> {
        match default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            other => {
                debug!("No config file ({other:?})");
                Ok(Self::default())
            }
        }
    }
}
