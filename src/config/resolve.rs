//! Environment variable substitution, API key resolution, and typed
//! accessors with defaults.

use std::time::Duration;

use super::types::{Config, ProviderEntry};
use crate::constants::{
    DEFAULT_MAX_ACTION_ITERATIONS, DEFAULT_MAX_TOKENS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TEMPERATURE, ENRICHMENT_MAX_TOKENS, ENRICHMENT_TEMPERATURE, SERPAPI_BASE_URL,
    SYSTEM_PROMPT, TMDB_BASE_URL,
};
use crate::provider::GenerationConfig;

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        for field in [
            &mut self.system_prompt,
            &mut self.default_provider,
            &mut self.enrichment.model,
            &mut self.movies.tmdb_api_key,
            &mut self.movies.tmdb_base_url,
            &mut self.movies.serpapi_api_key,
            &mut self.movies.serpapi_base_url,
        ] {
            if let Some(value) = field {
                *value = Self::resolve_str(value);
            }
        }
        Self::resolve_provider_entry(&mut self.provider.openai);
        Self::resolve_provider_entry(&mut self.provider.anthropic);
        Self::resolve_provider_entry(&mut self.provider.ollama);
        Self::resolve_provider_entry(&mut self.provider.openrouter);
    }

    /// Resolves `{env:VAR}` patterns in a single provider entry's string fields.
    fn resolve_provider_entry(entry: &mut Option<ProviderEntry>) {
        if let Some(ref mut e) = entry {
            for field in [&mut e.api_key, &mut e.base_url, &mut e.model] {
                if let Some(value) = field {
                    *value = Self::resolve_str(value);
                }
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    /// Unset variables become empty strings.
    pub(super) fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        while let Some(start) = result.find("{env:") {
            let Some(end) = result[start..].find('}') else {
                break;
            };
            let var_name = &result[start + 5..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        }
        result
    }

    /// Resolve API key for a provider: env var first, then config value.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        Self::env_or(
            &format!("{}_API_KEY", provider.to_uppercase()),
            self.provider_entry(provider).and_then(|e| e.api_key.as_deref()),
        )
    }

    /// Model pinned in `[provider.<name>]`, if set and non-empty.
    pub fn provider_model(&self, provider: &str) -> Option<String> {
        self.provider_entry(provider)
            .and_then(|e| e.model.as_deref())
            .filter(|m| !m.trim().is_empty())
            .map(String::from)
    }

    fn provider_entry(&self, provider: &str) -> Option<&ProviderEntry> {
        match provider {
            "openai" => self.provider.openai.as_ref(),
            "anthropic" => self.provider.anthropic.as_ref(),
            "ollama" => self.provider.ollama.as_ref(),
            "openrouter" => self.provider.openrouter.as_ref(),
            _ => None,
        }
    }

    /// Non-empty environment variable, falling back to a non-empty config value.
    fn env_or(env_key: &str, configured: Option<&str>) -> Option<String> {
        std::env::var(env_key)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| configured.filter(|v| !v.is_empty()).map(String::from))
    }

    /// Get the configured default provider name, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    /// Get the model name from config, stripping provider prefix if present.
    /// Returns None if the model is the compile-time default (meaning user hasn't configured it).
    pub fn model_name(&self) -> Option<String> {
        let m = &self.model;
        if m == crate::constants::DEFAULT_MODEL {
            return None;
        }
        if let Some((_prov, model)) = m.split_once('/') {
            Some(model.to_string())
        } else {
            Some(m.to_string())
        }
    }

    /// The behavioral contract that opens every transcript.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(SYSTEM_PROMPT)
    }

    /// Settings for the streamed answer.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.model.clone(),
            temperature: self.generation.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.generation.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }

    /// Settings for the review enrichment query.
    pub fn enrichment_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: self
                .enrichment
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| self.model.clone()),
            temperature: self.enrichment.temperature.unwrap_or(ENRICHMENT_TEMPERATURE),
            max_tokens: self.enrichment.max_tokens.unwrap_or(ENRICHMENT_MAX_TOKENS),
        }
    }

    /// Whether the review enrichment query runs before each answer.
    pub fn enrichment_enabled(&self) -> bool {
        self.enrichment.enabled.unwrap_or(true)
    }

    pub fn max_action_iterations(&self) -> usize {
        self.turn
            .max_action_iterations
            .unwrap_or(DEFAULT_MAX_ACTION_ITERATIONS)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.turn
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn tmdb_api_key(&self) -> Option<String> {
        Self::env_or("TMDB_API_KEY", self.movies.tmdb_api_key.as_deref())
    }

    pub fn tmdb_base_url(&self) -> String {
        self.movies
            .tmdb_base_url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| TMDB_BASE_URL.to_string())
    }

    pub fn serpapi_api_key(&self) -> Option<String> {
        Self::env_or("SERPAPI_API_KEY", self.movies.serpapi_api_key.as_deref())
    }

    pub fn serpapi_base_url(&self) -> String {
        self.movies
            .serpapi_base_url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| SERPAPI_BASE_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_str_substitutes_env() {
        std::env::set_var("MARQUEE_TEST_SUBST", "secret");
        assert_eq!(
            Config::resolve_str("key-{env:MARQUEE_TEST_SUBST}-end"),
            "key-secret-end"
        );
        assert_eq!(Config::resolve_str("{env:MARQUEE_TEST_UNSET_VAR}"), "");
        assert_eq!(Config::resolve_str("plain"), "plain");
        assert_eq!(Config::resolve_str("{env:UNCLOSED"), "{env:UNCLOSED");
    }

    #[test]
    fn test_generation_defaults() {
        let config = Config::default();
        let generation = config.generation_config();
        assert_eq!(generation.model, "gpt-4o");
        assert_eq!(generation.temperature, 0.2);
        assert_eq!(generation.max_tokens, 1000);
        assert_eq!(config.max_action_iterations(), 8);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert!(config.enrichment_enabled());
    }

    #[test]
    fn test_enrichment_model_falls_back_to_main_model() {
        let mut config = Config::default();
        config.model = "gpt-4o-mini".into();
        assert_eq!(config.enrichment_config().model, "gpt-4o-mini");
        assert_eq!(config.enrichment_config().max_tokens, 300);

        config.enrichment.model = Some("gpt-4o".into());
        assert_eq!(config.enrichment_config().model, "gpt-4o");
    }

    #[test]
    fn test_blank_system_prompt_uses_builtin_contract() {
        let mut config = Config::default();
        assert_eq!(config.system_prompt(), SYSTEM_PROMPT);
        config.system_prompt = Some("   ".into());
        assert_eq!(config.system_prompt(), SYSTEM_PROMPT);
        config.system_prompt = Some("Only talk about westerns.".into());
        assert_eq!(config.system_prompt(), "Only talk about westerns.");
    }

    #[test]
    fn test_unsubstituted_empty_key_is_missing() {
        let mut config = Config::default();
        config.movies.serpapi_api_key = Some(String::new());
        if std::env::var("SERPAPI_API_KEY").is_err() {
            assert_eq!(config.serpapi_api_key(), None);
        }
    }
}
