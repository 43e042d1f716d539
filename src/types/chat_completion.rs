use serde::{Deserialize, Serialize};

use crate::types::{Message, Model};

/// Request body for the chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionParams {
    /// The model that will generate the reply.
    pub model: Model,

    /// The conversation so far, oldest first.
    pub messages: Vec<Message>,
}

impl ChatCompletionParams {
    /// Create new request parameters.
    pub fn new(model: Model, messages: Vec<Message>) -> Self {
        Self { model, messages }
    }
}

/// Response body of the chat completions endpoint.
///
/// Only the fields the chat client reads are modelled; unknown fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCompletion {
    /// Unique identifier of the completion.
    #[serde(default)]
    pub id: Option<String>,

    /// The model that produced the completion.
    #[serde(default)]
    pub model: Option<String>,

    /// Generated choices.  The client requests exactly one.
    pub choices: Vec<Choice>,
}

/// A single generated choice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    /// Index of the choice in the list.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ChoiceMessage,

    /// Why generation stopped, e.g. `stop` or `length`.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The message carried in a [`Choice`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChoiceMessage {
    /// Role of the author; always `assistant` in practice.
    #[serde(default)]
    pub role: Option<String>,

    /// The generated text, absent for refusals and tool calls.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Returns the text of the first choice, if there is one.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}
