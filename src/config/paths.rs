//! XDG path resolution for marquee configuration and cache directories.

use anyhow::Result;
use std::path::PathBuf;

use super::types::Config;

impl Config {
    /// Returns the platform-specific configuration directory for marquee.
    ///
    /// Returns `~/.config/marquee/` on Linux (`XDG_CONFIG_HOME/marquee`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's config directory cannot be determined.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join(crate::constants::APP_NAME);
        Ok(dir)
    }

    /// Returns `~/.cache/marquee/` on Linux. Holds readline history only;
    /// conversations are never written to disk.
    pub fn cache_dir() -> Result<PathBuf> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
            .join(crate::constants::APP_NAME);
        Ok(dir)
    }

    /// Returns the full path to the marquee configuration file.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(crate::constants::CONFIG_FILENAME))
    }
}
