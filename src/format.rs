//! Terminal formatting for transcript messages and model answers.

use colored::Colorize;

use crate::message::{Message, Role};

/// Format a message for terminal display with role label and colors.
pub fn format_message(msg: &Message) -> String {
    let label = match msg.role {
        Role::User => "you:".green().bold().to_string(),
        Role::Assistant => "marquee:".cyan().bold().to_string(),
        Role::System => "system:".dimmed().to_string(),
        Role::ActionResult => {
            format!("{}:", msg.action_name.as_deref().unwrap_or("action"))
                .yellow()
                .to_string()
        }
    };
    let body = match msg.role {
        Role::User => msg.text().to_string(),
        Role::Assistant => render_markdown_lite(msg.text()),
        Role::System | Role::ActionResult => msg.text().dimmed().to_string(),
    };
    format!("{}\n{}", label, body)
}

/// Minimal markdown renderer for terminal output.
///
/// Handles `**bold**`, `` `inline code` `` and fenced code blocks, which
/// covers nearly everything a chat answer uses.
pub fn render_markdown_lite(text: &str) -> String {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for line in text.lines() {
        if let Some(lang) = line.strip_prefix("```") {
            in_code_block = !in_code_block;
            if in_code_block && !lang.trim().is_empty() {
                lines.push(format!("  {}", lang.trim().dimmed()));
            }
            continue;
        }
        if in_code_block {
            lines.push(format!("  {}", line.dimmed()));
        } else {
            lines.push(render_inline(line));
        }
    }
    lines.join("\n")
}

/// Styles `**bold**` and `` `code` `` spans within one line. An unmatched
/// marker is printed as-is.
fn render_inline(line: &str) -> String {
    let mut out = String::new();
    let mut rest = line;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                out.push_str(&after[..end].bold().to_string());
                rest = &after[end + 2..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('`') {
            if let Some(end) = after.find('`') {
                out.push_str(&after[..end].dimmed().to_string());
                rest = &after[end + 1..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}
