//! Line-oriented console input.
//!
//! The session reads every line through the [`Console`] trait so that it can
//! be driven by a scripted double in tests.  [`RustylineConsole`] is the
//! terminal implementation.

use std::io;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::{Error, Result};

/// ANSI escape code for yellow text (used for prompts).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Blocking source of input lines.
pub trait Console {
    /// Shows `prompt` and blocks until the user enters a line.
    ///
    /// Returns `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Console backed by a rustyline editor.
pub struct RustylineConsole {
    editor: DefaultEditor,
    use_color: bool,
}

impl RustylineConsole {
    /// Creates a console on the controlling terminal.
    pub fn new(use_color: bool) -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(Self { editor, use_color })
    }
}

impl Console for RustylineConsole {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let prompt = if self.use_color {
            format!("{ANSI_YELLOW}{prompt}{ANSI_RESET}")
        } else {
            prompt.to_string()
        };
        match self.editor.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            // Ctrl+C abandons the current line but keeps the session alive.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(readline_error(err)),
        }
    }
}

fn readline_error(err: ReadlineError) -> Error {
    match err {
        ReadlineError::Io(err) => Error::io("failed to read from terminal", err),
        err => Error::io(
            format!("failed to read from terminal: {err}"),
            io::Error::other(err.to_string()),
        ),
    }
}
