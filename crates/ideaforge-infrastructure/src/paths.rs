//! Path management for Ideaforge configuration files.
//!
//! ```text
//! ~/.config/ideaforge/
//! └── config.toml
//! ```

use std::path::PathBuf;

use ideaforge_core::{ForgeError, Result};

const APP_DIR: &str = "ideaforge";
const CONFIG_FILE: &str = "config.toml";

pub struct ForgePaths;

impl ForgePaths {
    /// Returns the platform configuration directory for ideaforge.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| ForgeError::configuration("Cannot find configuration directory"))
    }

    /// Returns the default configuration file path.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }
}
