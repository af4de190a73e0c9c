//! rig-core backed [`CompletionService`].
//!
//! Contains the [`Provider`] struct which wraps rig-core provider clients
//! behind enum dispatch, keeping provider-specific details out of the turn
//! loop. Supports OpenAI, Anthropic, OpenRouter, and Ollama.

use anyhow::{Context, Result};
use futures::StreamExt;
use rig::agent::MultiTurnStreamItem;
use rig::client::CompletionClient;
use rig::completion::Chat;
use rig::message::{Message as RigMessage, Text};
use rig::providers::{anthropic, openai, openrouter};
use rig::streaming::{StreamedAssistantContent, StreamingChat};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::kind::ProviderKind;
use super::resolve::ModelSelection;
use super::{CompletionService, GenerationConfig};
use crate::config::Config;
use crate::message::{Message, Role};

/// Internal enum wrapping provider-specific clients.
enum ClientKind {
    OpenAI(openai::Client),
    Anthropic(anthropic::Client),
    OpenRouter(openrouter::Client),
    Ollama(openai::Client),
}

/// A configured LLM provider ready to handle completion requests.
///
/// Agents are constructed on each call since they are cheap to create and
/// every request carries its own preamble and [`GenerationConfig`].
pub struct Provider {
    client: ClientKind,
}

/// Builds an agent from the given client, optional preamble, and
/// generation settings, then executes the block with it bound to `$agent`.
macro_rules! with_agent {
    ($client:expr, $sys:expr, $cfg:expr, |$agent:ident| $body:expr) => {{
        let $agent = if let Some(sys) = $sys {
            $client
                .agent(&$cfg.model)
                .preamble(sys)
                .temperature($cfg.temperature)
                .max_tokens($cfg.max_tokens)
                .build()
        } else {
            $client
                .agent(&$cfg.model)
                .temperature($cfg.temperature)
                .max_tokens($cfg.max_tokens)
                .build()
        };
        $body
    }};
}

/// Dispatches an operation across provider-specific clients.
///
/// Matches on [`ClientKind`] and executes the same block for each variant,
/// letting the compiler monomorphize per provider.
macro_rules! dispatch {
    ($self:expr, |$client:ident| $body:expr) => {
        match &$self.client {
            ClientKind::OpenAI($client) => $body,
            ClientKind::Anthropic($client) => $body,
            ClientKind::OpenRouter($client) => $body,
            ClientKind::Ollama($client) => $body,
        }
    };
}

/// Drains a streaming response, forwarding text chunks to the channel.
///
/// A closed receiver is not an error: the stream is still drained so the
/// provider connection ends cleanly.
macro_rules! forward_stream {
    ($stream:expr, $tokens:expr) => {
        while let Some(chunk) = $stream.next().await {
            match chunk {
                Ok(MultiTurnStreamItem::StreamAssistantItem(StreamedAssistantContent::Text(
                    Text { text },
                ))) => {
                    let _ = $tokens.send(text);
                }
                Ok(MultiTurnStreamItem::FinalResponse(_)) => {
                    // Stream complete
                }
                Err(err) => {
                    anyhow::bail!("Streaming error: {}", err);
                }
                _ => {
                    // Reasoning and native tool-call deltas are not part of
                    // the text protocol.
                }
            }
        }
    };
}

impl Provider {
    /// Creates a new [`Provider`] from the loaded application config.
    ///
    /// Resolves the API key through the config precedence chain
    /// (env var → config file → substitution) and builds the appropriate
    /// provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is found for the selected provider
    /// or if client construction fails.
    pub fn from_config(config: &Config, selection: &ModelSelection) -> Result<Self> {
        let client = match selection.provider {
            ProviderKind::OpenAI => {
                let api_key = config
                    .resolve_api_key("openai")
                    .context("No API key found for OpenAI. Set OPENAI_API_KEY or configure it in config.toml")?;
                ClientKind::OpenAI(
                    openai::Client::new(&api_key).context("Failed to create OpenAI client")?,
                )
            }
            ProviderKind::Anthropic => {
                let api_key = config
                    .resolve_api_key("anthropic")
                    .context("No API key found for Anthropic. Set ANTHROPIC_API_KEY or configure it in config.toml")?;
                ClientKind::Anthropic(
                    anthropic::Client::new(&api_key)
                        .context("Failed to create Anthropic client")?,
                )
            }
            ProviderKind::OpenRouter => {
                let api_key = config
                    .resolve_api_key("openrouter")
                    .context("No API key found for OpenRouter. Set OPENROUTER_API_KEY or configure it in config.toml")?;
                ClientKind::OpenRouter(
                    openrouter::Client::new(&api_key)
                        .context("Failed to create OpenRouter client")?,
                )
            }
            ProviderKind::Ollama => {
                let base_url = config
                    .provider
                    .ollama
                    .as_ref()
                    .and_then(|o| o.base_url.as_deref())
                    .unwrap_or(crate::constants::OLLAMA_DEFAULT_BASE_URL);
                ClientKind::Ollama(
                    openai::Client::builder()
                        .api_key("ollama")
                        .base_url(format!("{}/v1", base_url))
                        .build()
                        .context("Failed to create Ollama client")?,
                )
            }
        };
        debug!(provider = selection.provider.name(), model = %selection.model, "provider ready");
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl CompletionService for Provider {
    async fn stream_complete(
        &self,
        transcript: &[Message],
        config: &GenerationConfig,
        tokens: UnboundedSender<String>,
    ) -> Result<()> {
        let request = RigRequest::from_transcript(transcript);

        dispatch!(self, |client| {
            let mut stream = with_agent!(client, request.preamble, config, |agent| {
                agent
                    .stream_chat(request.prompt.clone(), request.history.clone())
                    .await
            });
            forward_stream!(stream, tokens);
        });
        Ok(())
    }

    async fn complete(&self, prompt: &[Message], config: &GenerationConfig) -> Result<String> {
        let request = RigRequest::from_transcript(prompt);

        dispatch!(self, |client| {
            let response = with_agent!(client, request.preamble, config, |agent| {
                agent
                    .chat(request.prompt.clone(), request.history.clone())
                    .await
                    .context("LLM API call failed")?
            });
            Ok(response)
        })
    }
}

/// A transcript split into rig-core's agent shape.
struct RigRequest<'a> {
    /// The opening system message becomes the agent preamble.
    preamble: Option<&'a str>,
    /// The final message is sent as the prompt.
    prompt: RigMessage,
    /// Everything in between is chat history.
    history: Vec<RigMessage>,
}

impl<'a> RigRequest<'a> {
    fn from_transcript(transcript: &'a [Message]) -> Self {
        let (preamble, rest) = match transcript.split_first() {
            Some((first, rest)) if first.role == Role::System => (Some(first.text()), rest),
            _ => (None, transcript),
        };

        let mut history: Vec<RigMessage> = rest.iter().map(convert_message_to_rig).collect();
        let prompt = history.pop().unwrap_or_else(|| RigMessage::user(""));

        Self {
            preamble,
            prompt,
            history,
        }
    }
}

/// Converts a transcript [`Message`] to a rig-core [`RigMessage`].
///
/// rig agents only carry user and assistant turns past the preamble, so
/// action results and later system notes are sent as labelled user turns.
fn convert_message_to_rig(msg: &Message) -> RigMessage {
    match msg.role {
        Role::Assistant => RigMessage::assistant(msg.text()),
        _ => RigMessage::user(rig_text(msg)),
    }
}

/// The text a message is sent with, including any label.
fn rig_text(msg: &Message) -> String {
    match msg.role {
        Role::User | Role::Assistant => msg.text().to_string(),
        Role::ActionResult => format!(
            "[result of {}]\n{}",
            msg.action_name.as_deref().unwrap_or("action"),
            msg.text()
        ),
        Role::System => format!("[system] {}", msg.text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rig_text_labels_non_chat_roles() {
        assert_eq!(rig_text(&Message::user("hi")), "hi");
        assert_eq!(
            rig_text(&Message::action_result("get_showtimes", "7 PM")),
            "[result of get_showtimes]\n7 PM"
        );
        assert_eq!(
            rig_text(&Message::system("CONTEXT: reviews")),
            "[system] CONTEXT: reviews"
        );
    }

    #[test]
    fn test_request_splits_preamble_prompt_and_history() {
        let transcript = vec![
            Message::system("contract"),
            Message::user("what's playing?"),
            Message::assistant(r#"{"function": "get_now_playing_movies", "parameters": {}}"#),
            Message::action_result("get_now_playing_movies", "Dune"),
        ];
        let request = RigRequest::from_transcript(&transcript);
        assert_eq!(request.preamble, Some("contract"));
        assert_eq!(request.history.len(), 2);
        assert!(matches!(request.history[1], RigMessage::Assistant { .. }));
        assert!(matches!(request.prompt, RigMessage::User { .. }));
    }

    #[test]
    fn test_request_without_system_has_no_preamble() {
        let transcript = vec![Message::user("hello")];
        let request = RigRequest::from_transcript(&transcript);
        assert_eq!(request.preamble, None);
        assert!(request.history.is_empty());
    }
}
