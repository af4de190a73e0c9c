//! File loading and merging for marquee configuration.

use anyhow::{Context, Result};
use std::fs;

use super::types::{
    default_model, Config, EnrichmentSettings, GenerationSettings, MoviesConfig, TurnSettings,
};

/// Written to `~/.config/marquee/config.toml` on first run.
pub(super) fn default_config_toml() -> String {
    format!(
        r#"model = "{}"

[generation]
temperature = {}
max_tokens = {}

[turn]
max_action_iterations = {}

[provider]

[provider.openai]
api_key = "{{env:OPENAI_API_KEY}}"

[provider.anthropic]
api_key = "{{env:ANTHROPIC_API_KEY}}"

[provider.openrouter]
api_key = "{{env:OPENROUTER_API_KEY}}"

[provider.ollama]
base_url = "http://localhost:11434"

[movies]
tmdb_api_key = "{{env:TMDB_API_KEY}}"
serpapi_api_key = "{{env:SERPAPI_API_KEY}}"
"#,
        default_model(),
        crate::constants::DEFAULT_TEMPERATURE,
        crate::constants::DEFAULT_MAX_TOKENS,
        crate::constants::DEFAULT_MAX_ACTION_ITERATIONS,
    )
}

impl Config {
    /// Loads the global config from `~/.config/marquee/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for API keys) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = default_config_toml();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            let config: Config =
                toml::from_str(&default_toml).context("Failed to parse default config")?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }

    /// Look for marquee.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                let contents = fs::read_to_string(&candidate)?;
                let config: Config = toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config at {:?}", candidate))?;
                return Ok(Some(config));
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            provider: global.provider, // TODO: deep merge providers
            default_provider: project.default_provider.or(global.default_provider),
            system_prompt: project.system_prompt.or(global.system_prompt),
            generation: GenerationSettings {
                temperature: project
                    .generation
                    .temperature
                    .or(global.generation.temperature),
                max_tokens: project.generation.max_tokens.or(global.generation.max_tokens),
            },
            enrichment: EnrichmentSettings {
                enabled: project.enrichment.enabled.or(global.enrichment.enabled),
                model: project.enrichment.model.or(global.enrichment.model),
                temperature: project
                    .enrichment
                    .temperature
                    .or(global.enrichment.temperature),
                max_tokens: project.enrichment.max_tokens.or(global.enrichment.max_tokens),
            },
            turn: TurnSettings {
                max_action_iterations: project
                    .turn
                    .max_action_iterations
                    .or(global.turn.max_action_iterations),
                request_timeout_secs: project
                    .turn
                    .request_timeout_secs
                    .or(global.turn.request_timeout_secs),
            },
            movies: MoviesConfig {
                tmdb_api_key: project.movies.tmdb_api_key.or(global.movies.tmdb_api_key),
                tmdb_base_url: project.movies.tmdb_base_url.or(global.movies.tmdb_base_url),
                serpapi_api_key: project
                    .movies
                    .serpapi_api_key
                    .or(global.movies.serpapi_api_key),
                serpapi_base_url: project
                    .movies
                    .serpapi_base_url
                    .or(global.movies.serpapi_base_url),
            },
        }
    }
}
