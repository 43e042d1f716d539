//! Conversation state: the chat history and the user's display name.
//!
//! Nothing in here performs I/O.  The session owns exactly one
//! [`SessionState`] and is the only writer of its history.

use crate::error::{Error, Result};
use crate::types::{Message, Role};

/// Name shown in the prompt when the user did not give one.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// History and user identity for one chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    messages: Vec<Message>,
    display_name: String,
}

impl SessionState {
    /// Creates an empty state with no display name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `context` as a leading system message.
    ///
    /// Blank context is ignored, as is a second context once one is present.
    pub fn append_context(&mut self, context: &str) {
        let context = context.trim();
        if context.is_empty() || self.context().is_some() {
            return;
        }
        self.messages.insert(0, Message::system(context));
    }

    /// Appends one exchange: the user's message followed by the reply.
    pub fn append_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(Message::user(user));
        self.messages.push(Message::assistant(assistant));
    }

    /// Empties the history, context included.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Removes the most recent exchange and returns what the user said in it.
    ///
    /// The last two messages must be a user message followed by an assistant
    /// message; otherwise the history is left untouched and a precondition
    /// error is returned.
    pub fn pop_last_turn(&mut self) -> Result<String> {
        let len = self.messages.len();
        if len < 2 {
            return Err(Error::precondition(
                "Nothing to regenerate: no previous response in this conversation",
            ));
        }
        let (user, assistant) = (&self.messages[len - 2], &self.messages[len - 1]);
        if user.role != Role::User || assistant.role != Role::Assistant {
            return Err(Error::precondition(
                "Nothing to regenerate: the last entry is not a completed exchange",
            ));
        }
        self.messages.pop();
        let user = self.messages.pop().map(|message| message.content);
        user.ok_or_else(|| Error::precondition("Nothing to regenerate"))
    }

    /// Replaces the display name.  Blank input keeps the current name.
    pub fn rename(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.display_name = name.to_string();
        }
    }

    /// The name to show in the prompt.
    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            DEFAULT_DISPLAY_NAME
        } else {
            &self.display_name
        }
    }

    /// The conversation context, if one was set.
    pub fn context(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|message| message.role == Role::System)
            .map(|message| message.content.as_str())
    }

    /// The history, oldest message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the history.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when the history is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
