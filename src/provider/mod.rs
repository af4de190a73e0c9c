//! LLM provider abstraction for marquee.
//!
//! The turn loop talks to the model only through [`CompletionService`].
//! [`Provider`] implements it on top of rig-core's clients for Anthropic,
//! OpenAI, OpenRouter, and Ollama (local), selected via [`ProviderKind`].

mod client;
mod kind;
mod resolve;

pub use client::Provider;
#[allow(unused_imports)]
pub use kind::{default_model_for, ProviderKind};
pub use resolve::{resolve_model, ModelSelection};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::message::Message;

/// Per-request generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

/// A text-completion backend.
///
/// Shared read-only by every session, so implementations must be
/// `Send + Sync` and keep no per-conversation state.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Streams a completion over `transcript`, sending each text chunk to
    /// `tokens` as it arrives. Returns once the stream has ended.
    ///
    /// The sender is dropped on return, which ends the consumer's receive
    /// loop. Chunks sent before an error are still delivered.
    async fn stream_complete(
        &self,
        transcript: &[Message],
        config: &GenerationConfig,
        tokens: UnboundedSender<String>,
    ) -> Result<()>;

    /// Runs a single, non-streamed completion over `prompt`.
    async fn complete(&self, prompt: &[Message], config: &GenerationConfig) -> Result<String>;
}
