//! Struct definitions and serde defaults for marquee configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for marquee, deserialized from `config.toml`.
///
/// Fields use serde defaults so marquee can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default model identifier (e.g. `"gpt-4o"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Default provider name (e.g., "openai", "anthropic").
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Replaces the built-in movie assistant contract when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Sampling settings for the main answer stream.
    #[serde(default)]
    pub generation: GenerationSettings,
    /// Review enrichment query settings.
    #[serde(default)]
    pub enrichment: EnrichmentSettings,
    /// Turn loop limits.
    #[serde(default)]
    pub turn: TurnSettings,
    /// Movie data API credentials.
    #[serde(default)]
    pub movies: MoviesConfig,
}

/// Returns the default model identifier (`"gpt-4o"`).
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

/// Provider-specific configuration map.
///
/// Each field corresponds to a supported LLM provider. Only providers
/// the user has configured will be `Some`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    pub openai: Option<ProviderEntry>,
    pub anthropic: Option<ProviderEntry>,
    pub ollama: Option<ProviderEntry>,
    pub openrouter: Option<ProviderEntry>,
}

/// Connection details for a single LLM provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderEntry {
    /// API key for authentication. Can also be set via environment variables.
    pub api_key: Option<String>,
    /// Custom base URL for the provider's API (useful for proxies or self-hosted instances).
    pub base_url: Option<String>,
    /// Model identifier to use with this provider, overriding the global default.
    pub model: Option<String>,
}

/// `[generation]` section.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct GenerationSettings {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
}

/// `[enrichment]` section.
///
/// Controls the auxiliary query that decides whether to fetch reviews
/// before answering.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct EnrichmentSettings {
    /// Set to `false` to skip the review check entirely.
    pub enabled: Option<bool>,
    /// Model for the query. Defaults to the main model.
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
}

/// `[turn]` section.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct TurnSettings {
    /// Action dispatches allowed per user message.
    pub max_action_iterations: Option<usize>,
    /// Seconds before a completion, enrichment query, or action times out.
    pub request_timeout_secs: Option<u64>,
}

/// `[movies]` section.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct MoviesConfig {
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub serpapi_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            provider: ProviderConfig::default(),
            default_provider: None,
            system_prompt: None,
            generation: GenerationSettings::default(),
            enrichment: EnrichmentSettings::default(),
            turn: TurnSettings::default(),
            movies: MoviesConfig::default(),
        }
    }
}
