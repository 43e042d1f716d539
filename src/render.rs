//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction so the session
//! can be driven against a real terminal or a recording double.  The default
//! implementation uses ANSI escape codes for the bot label, help entries and
//! errors.

use std::io::{self, Stdout, Write};

/// ANSI escape code for bold text (used for the banner and help entries).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for green text (used for the bot label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Label printed in front of everything the bot says.
pub const BOT_LABEL: &str = "Bot: ";

/// Trait for rendering chat output.
pub trait Renderer {
    /// Print a line of the welcome banner.
    fn print_banner(&mut self, line: &str);

    /// Print an assistant reply.
    fn print_reply(&mut self, text: &str);

    /// Print an informational message from the bot (confirmations, URLs).
    fn print_info(&mut self, info: &str);

    /// Print an unlabelled line, such as a menu option.
    fn print_line(&mut self, line: &str);

    /// Print the command list, one `(command, description)` pair per line.
    fn print_help(&mut self, entries: &[(&str, &str)]);

    /// Print an error message.
    fn print_error(&mut self, error: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn bot_label(&self) -> String {
        if self.use_color {
            format!("{ANSI_BOLD}{ANSI_GREEN}{BOT_LABEL}{ANSI_RESET}")
        } else {
            BOT_LABEL.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_banner(&mut self, line: &str) {
        if self.use_color {
            println!("{ANSI_BOLD}{ANSI_GREEN}{line}{ANSI_RESET}");
        } else {
            println!("{line}");
        }
        self.flush();
    }

    fn print_reply(&mut self, text: &str) {
        println!("{}{text}", self.bot_label());
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        println!("{}{info}", self.bot_label());
        self.flush();
    }

    fn print_line(&mut self, line: &str) {
        println!("{line}");
        self.flush();
    }

    fn print_help(&mut self, entries: &[(&str, &str)]) {
        println!("{}Here is a list of commands:", self.bot_label());
        for (command, description) in entries {
            if self.use_color {
                println!("{ANSI_BOLD}{command}{ANSI_RESET} - {description}");
            } else {
                println!("{command} - {description}");
            }
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.flush();
        if self.use_color {
            eprintln!("{ANSI_RED}{error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
