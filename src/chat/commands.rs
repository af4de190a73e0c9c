//! Slash command handlers for the chat REPL.
//!
//! Dispatches `/history`, `/reset` and `/help`. Returns a [`CommandAction`]
//! so the REPL loop can decide how to proceed.

use colored::Colorize;

use crate::format;
use crate::message::Role;
use crate::session::ChatSession;

/// Action returned by slash command handling.
#[derive(Debug, PartialEq)]
pub(crate) enum CommandAction {
    /// Command was handled successfully; continue the REPL loop.
    Continue,
    /// Unknown command was entered.
    Unknown(String),
}

pub(crate) fn handle_slash_command(command: &str, session: &mut ChatSession) -> CommandAction {
    match command {
        "/history" => {
            println!(
                "{}",
                format!(
                    "session {} started {}, {} messages from you",
                    session.short_id(),
                    session.started_at.format("%H:%M:%S UTC"),
                    session.transcript.count_role(Role::User)
                )
                .dimmed()
            );
            if session.transcript.conversation().next().is_none() {
                println!("{}", "Nothing said yet.".dimmed());
            }
            for msg in session.transcript.conversation() {
                println!("{}", format::format_message(msg));
                println!();
            }
            CommandAction::Continue
        }
        "/reset" => {
            session.reset();
            println!(
                "{} [session: {}]",
                "Conversation reset.".dimmed(),
                session.short_id().yellow()
            );
            CommandAction::Continue
        }
        "/help" => {
            println!("{}", "Commands:".bold());
            println!("  {} - show conversation history", "/history".cyan());
            println!("  {} - start over with a fresh conversation", "/reset".cyan());
            println!("  {} - show this help", "/help".cyan());
            println!("  {} - exit", "Ctrl+D".cyan());
            CommandAction::Continue
        }
        _ => CommandAction::Unknown(command.to_string()),
    }
}
