//! Interactive chat REPL for marquee.
//!
//! Provides a multi-turn conversation loop using [`rustyline`] for readline
//! support (history, line editing). Each user line runs one turn through the
//! [`TurnEngine`]; the session lives in memory and is dropped on exit.

mod commands;

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::config::Config;
use crate::presentation::StdoutPresenter;
use crate::provider::ModelSelection;
use crate::session::ChatSession;
use crate::turn::TurnEngine;

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C**: cancels current input, stays in REPL
/// - **Ctrl+D**: exits cleanly with "goodbye."
/// - Readline history is persisted to `~/.cache/marquee/chat_history.txt`
///
/// Only the typed lines are kept across runs, never the conversation.
pub async fn run_chat(config: &Config, engine: TurnEngine, selection: &ModelSelection) -> Result<()> {
    let mut session = ChatSession::new(config.system_prompt());
    println!(
        "{} [session: {}] [model: {}/{}] (Ctrl+D to exit, /help for commands)",
        "marquee chat".bold().cyan(),
        session.short_id().yellow(),
        selection.provider.name().yellow(),
        selection.model.yellow(),
    );
    println!();

    let mut rl = DefaultEditor::new()?;
    let history_path = Config::cache_dir()?.join(crate::constants::HISTORY_FILENAME);
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    let mut presenter = StdoutPresenter::new();

    loop {
        let readline = rl.readline(&format!("{} ", ">".green().bold()));

        match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                if line.starts_with('/') {
                    match commands::handle_slash_command(&line, &mut session) {
                        commands::CommandAction::Continue => continue,
                        commands::CommandAction::Unknown(cmd) => {
                            println!("{} Unknown command: {}", "?".yellow(), cmd);
                            continue;
                        }
                    }
                }

                let _ = rl.add_history_entry(&line);
                println!();

                // The engine has already shown any failure; the REPL keeps going.
                match engine.run_turn(&mut session, &line, &mut presenter).await {
                    Ok(summary) => {
                        debug!(?summary, messages = session.transcript.len(), "turn finished")
                    }
                    Err(err) => debug!(error = %err, "turn ended early"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "goodbye.".dimmed());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}
