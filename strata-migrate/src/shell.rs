//! Interactive shell abstraction.

use std::collections::VecDeque;
use std::io::{self, Write};

use owo_colors::OwoColorize;

/// Line-oriented interactive prompts.
///
/// The generator only needs yes/no confirmation, free-form replies, and
/// informational output, so the surface stays narrow enough to script in
/// tests.
pub trait Shell {
    /// Ask a yes/no question. Anything that is not an explicit yes counts
    /// as no.
    fn confirm(&mut self, message: &str) -> bool;

    /// Ask for a line of input.
    fn prompt(&mut self, message: &str) -> String;

    /// Print an informational line.
    fn info(&mut self, message: &str);
}

/// Shell backed by standard input and output.
#[derive(Debug, Default)]
pub struct TermShell;

impl Shell for TermShell {
    fn confirm(&mut self, message: &str) -> bool {
        print!("{} {} ", message, "[y/N]".dimmed());
        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            return false;
        }
        matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn prompt(&mut self, message: &str) -> String {
        print!("{message}: ");
        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            return String::new();
        }
        input.trim().to_string()
    }

    fn info(&mut self, message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }
}

/// Shell that replays canned replies, for tests and non-interactive runs.
///
/// Replies are consumed front to back by `confirm` and `prompt`; an
/// exhausted queue answers "no" and the empty string. Every message shown
/// is recorded in [`ScriptedShell::transcript`].
#[derive(Debug, Default)]
pub struct ScriptedShell {
    replies: VecDeque<String>,
    /// Every message shown, in order.
    pub transcript: Vec<String>,
}

impl ScriptedShell {
    /// Create a shell with a fixed list of replies.
    pub fn new<I, R>(replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Queue another reply.
    pub fn push_reply(&mut self, reply: impl Into<String>) {
        self.replies.push_back(reply.into());
    }
}

impl Shell for ScriptedShell {
    fn confirm(&mut self, message: &str) -> bool {
        self.transcript.push(message.to_string());
        matches!(
            self.replies.pop_front().as_deref().map(str::trim),
            Some("y") | Some("yes")
        )
    }

    fn prompt(&mut self, message: &str) -> String {
        self.transcript.push(message.to_string());
        self.replies.pop_front().unwrap_or_default()
    }

    fn info(&mut self, message: &str) {
        self.transcript.push(message.to_string());
    }
}
