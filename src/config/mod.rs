//! Configuration types and path resolution for marquee.
//!
//! marquee stores its settings as TOML at the platform's XDG config path
//! (e.g. `~/.config/marquee/config.toml` on Linux). A `marquee.toml` found in
//! the current directory or above overrides it.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::Config;
#[allow(unused_imports)]
pub use types::{
    EnrichmentSettings, GenerationSettings, MoviesConfig, ProviderConfig, ProviderEntry,
    TurnSettings,
};

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project()?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        Ok(config)
    }
}
