//! Entry point for marquee, a conversational movie assistant for the terminal.
//!
//! This binary loads environment variables, sets up logging, parses CLI
//! arguments via [`cli`], and dispatches to the appropriate subcommand handler.

mod actions;
mod chat;
mod cli;
mod config;
mod constants;
mod enrichment;
mod format;
mod message;
mod presentation;
mod provider;
mod session;
#[cfg(test)]
mod testing;
mod transcript;
mod turn;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Runs the marquee CLI.
///
/// Loads `.env` files (silently ignored if absent), installs the tracing
/// subscriber on stderr so it never interleaves with streamed answers, then
/// parses arguments and dispatches the chosen subcommand via [`cli::run`].
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marquee=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::parse();
    cli::run(cli).await
}
