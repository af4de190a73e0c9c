//! Output rendering abstraction for marquee.
//!
//! Defines the [`Presenter`] trait that decouples the turn loop from the
//! display layer. [`StdoutPresenter`] streams tokens to the terminal and
//! reprints the finished answer with light markdown formatting.

use colored::Colorize;
use std::io::{self, Write};

use crate::format;

/// Identifies one streamed message on a presenter.
#[derive(Debug, PartialEq, Eq)]
pub struct MessageHandle(pub usize);

/// Trait for displaying conversation output.
pub trait Presenter: Send {
    /// Starts a new streamed message.
    fn begin_message(&mut self) -> MessageHandle;

    /// Appends a chunk to a streamed message as it arrives.
    fn append_token(&mut self, handle: &MessageHandle, token: &str);

    /// Called once the stream for `handle` has ended.
    fn finalize(&mut self, handle: MessageHandle);

    /// Displays a standalone, non-streamed message (e.g. an action result).
    fn show_message(&mut self, text: &str);

    /// Displays a failure. Defaults to a standalone message.
    fn show_error(&mut self, text: &str) {
        self.show_message(text);
    }
}

/// Renders streaming output directly to stdout.
///
/// Each token is printed immediately with an explicit flush so the user
/// sees a "typing" effect. The raw text is buffered so it can be erased and
/// reprinted with formatting once the message is finalized.
pub struct StdoutPresenter {
    next_handle: usize,
    chunk_count: usize,
    buffer: String,
}

impl StdoutPresenter {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            chunk_count: 0,
            buffer: String::new(),
        }
    }

    /// Calculates the number of cursor-up movements needed to erase the
    /// streamed raw text.
    ///
    /// Accounts for terminal line wrapping by using the actual terminal width.
    fn visual_line_count(&self) -> usize {
        let width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80)
            .max(1); // prevent division by zero

        let content_lines: usize = self
            .buffer
            .split('\n')
            .map(|line| line.chars().count().div_ceil(width).max(1))
            .sum();

        // The first line doesn't need a cursor-up to reach.
        content_lines.saturating_sub(1)
    }
}

impl Default for StdoutPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for StdoutPresenter {
    fn begin_message(&mut self) -> MessageHandle {
        self.buffer.clear();
        self.chunk_count = 0;
        self.next_handle += 1;
        MessageHandle(self.next_handle)
    }

    fn append_token(&mut self, _handle: &MessageHandle, token: &str) {
        self.buffer.push_str(token);
        print!("{}", token);
        // Flush immediately so each token appears as it arrives
        io::stdout().flush().ok();
        self.chunk_count += 1;
    }

    fn finalize(&mut self, _handle: MessageHandle) {
        if self.buffer.is_empty() {
            return;
        }
        // Move to the start of the streamed text, clear it, and reprint formatted.
        let up = self.visual_line_count();
        if up > 0 {
            print!("\x1b[{}A", up);
        }
        print!("\r\x1b[J");
        println!("{}", format::render_markdown_lite(&self.buffer));
        println!("{}", format!("[{} chunks]", self.chunk_count).dimmed());
        println!();
        io::stdout().flush().ok();
    }

    fn show_message(&mut self, text: &str) {
        println!("{}", text.dimmed());
        println!();
    }

    fn show_error(&mut self, text: &str) {
        eprintln!("{} {}", "error:".red().bold(), text);
        eprintln!();
    }
}
