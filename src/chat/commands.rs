//! Slash command parsing for the chat application.
//!
//! Commands are matched exactly and case-insensitively against the whole
//! (trimmed) input line.  They take no arguments; anything else, including
//! unknown `/words`, is chat text for the assistant.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Generate an image from a prompted description.
    Image,

    /// Display help information.
    Help,

    /// Change the user's display name.
    Name,

    /// Drop the last exchange and ask for a new reply to the same message.
    Regenerate,

    /// Exit the chat application.
    Exit,
}

impl ChatCommand {
    /// Every command, in the order the help text lists them.
    pub const ALL: [ChatCommand; 6] = [
        ChatCommand::Image,
        ChatCommand::Help,
        ChatCommand::Name,
        ChatCommand::Regenerate,
        ChatCommand::Clear,
        ChatCommand::Exit,
    ];

    /// The literal the user types.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatCommand::Clear => "/clear",
            ChatCommand::Image => "/image",
            ChatCommand::Help => "/help",
            ChatCommand::Name => "/name",
            ChatCommand::Regenerate => "/regenerate",
            ChatCommand::Exit => "/exit",
        }
    }

    /// One-line description for the help listing.
    pub fn description(&self) -> &'static str {
        match self {
            ChatCommand::Clear => "Clear chat history",
            ChatCommand::Image => "Generate an image",
            ChatCommand::Help => "Show this help message",
            ChatCommand::Name => "Change your name",
            ChatCommand::Regenerate => "Regenerate assistant response",
            ChatCommand::Exit => "Exit the program",
        }
    }
}

impl std::fmt::Display for ChatCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is exactly a command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use termchat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/exit"), Some(ChatCommand::Exit));
/// assert_eq!(parse_command("/IMAGE"), Some(ChatCommand::Image));
/// assert!(parse_command("/name Alice").is_none());
/// assert!(parse_command("Hello!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    ChatCommand::ALL
        .into_iter()
        .find(|command| command.as_str().eq_ignore_ascii_case(input))
}

/// Returns the `(command, description)` pairs shown by `/help`.
pub fn help_entries() -> Vec<(&'static str, &'static str)> {
    ChatCommand::ALL
        .iter()
        .map(|command| (command.as_str(), command.description()))
        .collect()
}
