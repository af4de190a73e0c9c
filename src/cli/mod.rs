//! Command-line interface definition and dispatch for marquee.
//!
//! Uses [`clap`] for argument parsing with derive macros. Each subcommand is
//! routed to its handler; `chat` and `ask` share the engine wiring in
//! [`build_engine`].

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::actions::{ActionRegistry, StandardBackend};
use crate::config::Config;
use crate::enrichment::{EnrichmentDecider, ModelDecider, NoEnrichment};
use crate::presentation::StdoutPresenter;
use crate::provider::{self, CompletionService, ModelSelection, Provider};
use crate::session::ChatSession;
use crate::turn::{TurnConfig, TurnEngine};
use crate::{chat, config};

/// Top-level CLI structure for marquee.
#[derive(Parser)]
#[command(name = "marquee", about = "A movie assistant for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the marquee CLI.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Ask a one-shot question
    Ask {
        /// The question to ask
        prompt: Vec<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// Provider to use (anthropic, openai, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Start an interactive chat session
    Chat {
        /// Provider to use (anthropic, openai, openrouter, ollama)
        #[arg(long)]
        provider: Option<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// Maximum action calls per message (overrides config)
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// List the actions the assistant can take
    Actions,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current config
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            prompt,
            model,
            provider: provider_name,
        } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                bail!("No prompt provided. Usage: marquee ask \"what's playing near me?\"");
            }

            let mut config = Config::load()?;
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            config.model = selection.model.clone();

            println!(
                "{} [model: {}]",
                "marquee".bold().cyan(),
                selection.model.yellow(),
            );
            println!();
            println!("{} {}", ">".green().bold(), prompt);
            println!();

            let engine = build_engine(&config, &selection, TurnConfig::from_config(&config))?;
            let mut session = ChatSession::new(config.system_prompt());
            let mut presenter = StdoutPresenter::new();
            if engine
                .run_turn(&mut session, &prompt, &mut presenter)
                .await
                .is_err()
            {
                // Already reported by the presenter.
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Chat {
            provider: provider_name,
            model,
            max_iterations,
        } => {
            let mut config = Config::load()?;
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            config.model = selection.model.clone();

            let mut turn_config = TurnConfig::from_config(&config);
            if let Some(max) = max_iterations {
                turn_config.max_action_iterations = max;
            }
            let engine = build_engine(&config, &selection, turn_config)?;
            chat::run_chat(&config, engine, &selection).await
        }
        Commands::Actions => {
            let registry = ActionRegistry::new(Arc::new(StandardBackend::from_config(
                &Config::load()?,
            )));
            println!("{}", "Actions:".bold());
            for kind in registry.kinds() {
                println!("  {}", kind.signature().cyan());
                println!("      {}", kind.description().dimmed());
            }
            Ok(())
        }
        Commands::Config { action } => {
            let config = Config::load()?;
            match action {
                ConfigAction::Show => {
                    let path = config::Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    let toml_str = toml::to_string_pretty(&config)?;
                    println!("{}", toml_str);
                }
            }
            Ok(())
        }
    }
}

/// Wires the provider, review decider and action registry into an engine.
fn build_engine(
    config: &Config,
    selection: &ModelSelection,
    turn_config: TurnConfig,
) -> Result<TurnEngine> {
    let completion: Arc<dyn CompletionService> =
        Arc::new(Provider::from_config(config, selection)?);

    let decider: Arc<dyn EnrichmentDecider> = if config.enrichment_enabled() {
        Arc::new(ModelDecider::new(
            completion.clone(),
            config.enrichment_config(),
        ))
    } else {
        Arc::new(NoEnrichment)
    };

    let registry = Arc::new(ActionRegistry::new(Arc::new(StandardBackend::from_config(
        config,
    ))));

    Ok(TurnEngine::new(completion, decider, registry, turn_config))
}
