//! Provider kind enumeration and default model mapping.

use anyhow::{anyhow, Result};

/// Identifies which LLM provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI (GPT models).
    OpenAI,
    /// Anthropic (Claude models).
    Anthropic,
    /// OpenRouter (multi-provider gateway).
    OpenRouter,
    /// Ollama (local models via OpenAI-compatible API).
    Ollama,
}

impl ProviderKind {
    /// Parses a provider name string into a [`ProviderKind`].
    ///
    /// Matching is case-insensitive. Returns an error for unknown providers.
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!(
                "Unknown provider: {other}. Supported: openai, anthropic, openrouter, ollama"
            )),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
        }
    }
}

/// Returns the default model identifier for a given provider.
pub fn default_model_for(provider: &ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAI => crate::constants::DEFAULT_MODEL,
        ProviderKind::Anthropic => crate::constants::DEFAULT_ANTHROPIC_MODEL,
        ProviderKind::OpenRouter => crate::constants::DEFAULT_OPENROUTER_MODEL,
        ProviderKind::Ollama => crate::constants::OLLAMA_DEFAULT_MODEL,
    }
}
