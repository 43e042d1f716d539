//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! state, dispatches commands and runs the read-eval-print loop.

use crate::chat::commands::{ChatCommand, help_entries, parse_command};
use crate::chat::config::ChatConfig;
use crate::chat::console::Console;
use crate::chat::state::SessionState;
use crate::client::{CompletionClient, ImageClient};
use crate::error::Result;
use crate::observability::{
    SESSION_COMMANDS, SESSION_ERRORS, SESSION_IMAGES_CANCELED, SESSION_REGENERATIONS,
    SESSION_TURNS,
};
use crate::render::Renderer;
use crate::types::{ImageSize, Message, Model};

const NAME_PROMPT: &str = "Type your name to begin (or press `enter` to skip): ";
const CONTEXT_PROMPT: &str =
    "Describe the context of the conversation (or press `enter` to skip): ";
const RENAME_PROMPT: &str = "Type your new name (press `enter` to leave as it was): ";
const IMAGE_PROMPT: &str = "Describe the image content: ";
const SIZE_PROMPT: &str = "Type your choice: ";
const SIZE_RETRY_PROMPT: &str = "Type your choice, or \"stop\" to cancel: ";

/// Token that abandons the image-size selection.
pub const CANCEL_TOKEN: &str = "stop";

/// Where the session loop currently is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Collecting the user's name and the conversation context.
    Startup,
    /// Waiting for the next line of input.
    AwaitingInput,
    /// Handling a line of input.
    Processing,
    /// The user exited; the loop is over.
    Terminated,
}

/// What the loop should do after a line has been dispatched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the loop.
    Exit,
}

/// A chat session that manages conversation state and API interactions.
pub struct ChatSession<C> {
    client: C,
    config: ChatConfig,
    state: SessionState,
    phase: SessionPhase,
}

impl<C: CompletionClient + ImageClient> ChatSession<C> {
    /// Creates a new chat session with the given client and configuration.
    pub fn new(client: C, config: ChatConfig) -> Self {
        Self {
            client,
            config,
            state: SessionState::new(),
            phase: SessionPhase::Startup,
        }
    }

    /// Returns the client the session talks to.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the conversation state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the current loop phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Returns the model used for replies.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// Prints the welcome banner and collects the user's name and context.
    ///
    /// # Errors
    ///
    /// Returns an error if the console cannot be read.  Startup errors are
    /// fatal to the session.
    pub fn start(&mut self, console: &mut dyn Console, renderer: &mut dyn Renderer) -> Result<()> {
        self.phase = SessionPhase::Startup;
        renderer.print_banner(&format!(
            "Welcome to termchat! (model: {})",
            self.config.model
        ));
        renderer.print_banner("You can start chatting with the bot.");
        renderer.print_banner("Type `/help` to see available commands.");

        if let Some(name) = console.read_line(NAME_PROMPT)? {
            self.state.rename(&name);
        }
        if let Some(context) = console.read_line(CONTEXT_PROMPT)? {
            self.state.append_context(&context);
        }
        log::debug!(
            "session started for {} (context: {})",
            self.state.display_name(),
            self.state.context().is_some()
        );
        self.phase = SessionPhase::AwaitingInput;
        Ok(())
    }

    /// Runs the whole session: startup, then the read-eval-print loop.
    ///
    /// Errors raised while handling a line are printed and the loop carries
    /// on.  The loop ends on `/exit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if startup fails or the console cannot be read at
    /// the main prompt.
    pub async fn run(
        &mut self,
        console: &mut dyn Console,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        self.start(console, renderer)?;

        loop {
            self.phase = SessionPhase::AwaitingInput;
            let prompt = format!("{}: ", self.state.display_name());
            let Some(line) = console.read_line(&prompt)? else {
                renderer.print_info("Good bye!");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            self.phase = SessionPhase::Processing;
            match self.dispatch(&line, console, renderer).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(err) => {
                    SESSION_ERRORS.click();
                    log::debug!("dispatch failed: {err:?}");
                    renderer.print_error(&err.to_string());
                }
            }
        }

        self.phase = SessionPhase::Terminated;
        log::info!(
            "session terminated with {} messages in history",
            self.state.len()
        );
        Ok(())
    }

    /// Handles one line of input: a command or a chat message.
    ///
    /// # Errors
    ///
    /// Returns service errors from the collaborators, precondition errors
    /// from `/regenerate`, and console errors from sub-prompts.
    pub async fn dispatch(
        &mut self,
        line: &str,
        console: &mut dyn Console,
        renderer: &mut dyn Renderer,
    ) -> Result<Flow> {
        match parse_command(line) {
            Some(command) => {
                SESSION_COMMANDS.click();
                log::debug!("dispatching {command}");
                self.run_command(command, console, renderer).await
            }
            None => {
                self.send(line, renderer).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn run_command(
        &mut self,
        command: ChatCommand,
        console: &mut dyn Console,
        renderer: &mut dyn Renderer,
    ) -> Result<Flow> {
        match command {
            ChatCommand::Image => {
                self.generate_image(console, renderer).await?;
            }
            ChatCommand::Help => renderer.print_help(&help_entries()),
            ChatCommand::Name => {
                if let Some(name) = console.read_line(RENAME_PROMPT)? {
                    self.rename(&name);
                }
            }
            ChatCommand::Regenerate => {
                self.regenerate(renderer).await?;
            }
            ChatCommand::Clear => {
                self.clear();
                renderer.print_info("Chat history cleared");
            }
            ChatCommand::Exit => {
                renderer.print_info("Good bye!");
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Sends a user message with the full history and prints the reply.
    ///
    /// The exchange is appended to the history only when the request
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion request fails.
    pub async fn send(&mut self, user_input: &str, renderer: &mut dyn Renderer) -> Result<String> {
        let mut messages = Vec::with_capacity(self.state.len() + 1);
        messages.extend_from_slice(self.state.messages());
        messages.push(Message::user(user_input));

        let reply = self.client.complete(&self.config.model, &messages).await?;
        renderer.print_reply(&reply);
        self.state.append_turn(user_input, reply.clone());
        SESSION_TURNS.click();
        Ok(reply)
    }

    /// Drops the last exchange and asks again with the same user message.
    ///
    /// If the new request fails the dropped exchange is put back.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when there is no exchange to drop, or
    /// the completion error.
    pub async fn regenerate(&mut self, renderer: &mut dyn Renderer) -> Result<String> {
        let snapshot = self.state.clone();
        let user_input = self.state.pop_last_turn()?;
        SESSION_REGENERATIONS.click();
        match self.send(&user_input, renderer).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                self.state = snapshot;
                Err(err)
            }
        }
    }

    /// Prompts for an image description and size, then generates the image.
    ///
    /// Returns `Ok(None)` when the user cancels; no request is made then.
    ///
    /// # Errors
    ///
    /// Returns an error if the image request fails or the console cannot be
    /// read.
    pub async fn generate_image(
        &mut self,
        console: &mut dyn Console,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<String>> {
        let description = console.read_line(IMAGE_PROMPT)?;
        let size = match description {
            Some(_) => select_image_size(console, renderer)?,
            None => None,
        };
        let (Some(description), Some(size)) = (description, size) else {
            SESSION_IMAGES_CANCELED.click();
            renderer.print_info("Image generation canceled");
            return Ok(None);
        };

        let url = self
            .client
            .generate_image(description.trim(), size)
            .await?;
        renderer.print_info(&format!("Image is ready! URL: {url}"));
        Ok(Some(url))
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.state.clear();
    }

    /// Changes the display name; blank input keeps the current one.
    pub fn rename(&mut self, name: &str) {
        self.state.rename(name);
    }
}

/// Shows the size menu and blocks until the user picks a size or cancels.
///
/// Unrecognised tokens re-prompt.  `Ok(None)` means the user typed the
/// cancel token or input ended.
fn select_image_size(
    console: &mut dyn Console,
    renderer: &mut dyn Renderer,
) -> Result<Option<ImageSize>> {
    renderer.print_info("Select image size");
    for (choice, size) in [
        ("1", ImageSize::Small),
        ("2", ImageSize::Medium),
        ("3", ImageSize::Large),
    ] {
        renderer.print_line(&format!("  Type \"{choice}\" for {size}px"));
    }
    renderer.print_line("  (Note that larger image costs more and takes more time to generate)");

    let mut prompt = SIZE_PROMPT;
    loop {
        let Some(token) = console.read_line(prompt)? else {
            return Ok(None);
        };
        let token = token.trim();
        if token == CANCEL_TOKEN {
            return Ok(None);
        }
        if let Some(size) = ImageSize::from_choice(token) {
            return Ok(Some(size));
        }
        prompt = SIZE_RETRY_PROMPT;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;

    #[derive(Default)]
    struct MockClient {
        replies: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<Vec<Message>>>,
        images: Mutex<Vec<(String, ImageSize)>>,
    }

    impl MockClient {
        fn replying(replies: &[&str]) -> Self {
            let client = Self::default();
            client
                .replies
                .lock()
                .unwrap()
                .extend(replies.iter().map(|r| Ok(r.to_string())));
            client
        }

        fn push_error(&self, err: Error) {
            self.replies.lock().unwrap().push_back(Err(err));
        }

        fn requests(&self) -> Vec<Vec<Message>> {
            self.requests.lock().unwrap().clone()
        }

        fn images(&self) -> Vec<(String, ImageSize)> {
            self.images.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CompletionClient for MockClient {
        async fn complete(&self, _: &Model, messages: &[Message]) -> Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::internal_server("no scripted reply")))
        }
    }

    #[async_trait::async_trait]
    impl ImageClient for MockClient {
        async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<String> {
            self.images.lock().unwrap().push((prompt.to_string(), size));
            Ok(format!("https://images.example.com/{}.png", size))
        }
    }

    struct ScriptedConsole {
        lines: VecDeque<String>,
        prompts: Vec<String>,
    }

    impl ScriptedConsole {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|s| s.to_string()).collect(),
                prompts: Vec::new(),
            }
        }
    }

    impl Console for ScriptedConsole {
        fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
            self.prompts.push(prompt.to_string());
            Ok(self.lines.pop_front())
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        lines: Vec<String>,
    }

    impl RecordingRenderer {
        fn errors(&self) -> Vec<&String> {
            self.lines
                .iter()
                .filter(|line| line.starts_with("error:"))
                .collect()
        }
    }

    impl Renderer for RecordingRenderer {
        fn print_banner(&mut self, line: &str) {
            self.lines.push(format!("banner: {line}"));
        }

        fn print_reply(&mut self, text: &str) {
            self.lines.push(format!("reply: {text}"));
        }

        fn print_info(&mut self, info: &str) {
            self.lines.push(format!("info: {info}"));
        }

        fn print_line(&mut self, line: &str) {
            self.lines.push(format!("line: {line}"));
        }

        fn print_help(&mut self, entries: &[(&str, &str)]) {
            for (command, description) in entries {
                self.lines.push(format!("help: {command} - {description}"));
            }
        }

        fn print_error(&mut self, error: &str) {
            self.lines.push(format!("error: {error}"));
        }
    }

    fn session(client: MockClient) -> ChatSession<MockClient> {
        ChatSession::new(client, ChatConfig::default())
    }

    #[tokio::test]
    async fn startup_seeds_name_and_context() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["Ada", "You are terse.", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert_eq!(session.state().display_name(), "Ada");
        assert_eq!(
            session.state().messages(),
            &[Message::system("You are terse.")]
        );
        assert_eq!(console.prompts[2], "Ada: ");
        assert_eq!(session.phase(), SessionPhase::Terminated);
    }

    #[tokio::test]
    async fn empty_context_leaves_history_empty() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["", "", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert!(session.state().is_empty());
        assert_eq!(console.prompts[2], "User: ");
    }

    #[tokio::test]
    async fn chat_turn_appends_user_and_reply() {
        let mut session = session(MockClient::replying(&["Hello."]));
        let mut console = ScriptedConsole::new(&["", "You are terse.", "Hi", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert_eq!(
            session.state().messages(),
            &[
                Message::system("You are terse."),
                Message::user("Hi"),
                Message::assistant("Hello."),
            ]
        );
        assert_eq!(
            session.client().requests(),
            vec![vec![Message::system("You are terse."), Message::user("Hi")]]
        );
        assert!(renderer.lines.contains(&"reply: Hello.".to_string()));
    }

    #[tokio::test]
    async fn service_error_is_reported_and_loop_continues() {
        let client = MockClient::default();
        client.push_error(Error::rate_limit("quota exceeded", None));
        client.replies.lock().unwrap().push_back(Ok("second".to_string()));
        let mut session = session(client);
        let mut console = ScriptedConsole::new(&["", "", "first", "again", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert_eq!(
            renderer.errors(),
            vec!["error: Rate limit exceeded: quota exceeded"]
        );
        assert_eq!(
            session.state().messages(),
            &[Message::user("again"), Message::assistant("second")]
        );
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["", "", "   ", "", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert!(session.client().requests().is_empty());
    }

    #[tokio::test]
    async fn end_of_input_terminates() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["Ada", ""]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert_eq!(session.phase(), SessionPhase::Terminated);
        assert_eq!(renderer.lines.last().unwrap(), "info: Good bye!");
    }

    #[tokio::test]
    async fn regenerate_resends_last_user_message() {
        let mut session = session(MockClient::replying(&["a1", "a2", "a2'"]));
        let mut console = ScriptedConsole::new(&["", "", "u1", "u2", "/regenerate", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        let requests = session.client().requests();
        assert_eq!(requests.len(), 3);
        // History at request time is the post-first-turn history.
        assert_eq!(
            requests[2],
            vec![
                Message::user("u1"),
                Message::assistant("a1"),
                Message::user("u2"),
            ]
        );
        assert_eq!(
            session.state().messages(),
            &[
                Message::user("u1"),
                Message::assistant("a1"),
                Message::user("u2"),
                Message::assistant("a2'"),
            ]
        );
    }

    #[tokio::test]
    async fn regenerate_without_history_is_a_precondition_error() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["", "ctx", "/regenerate", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert_eq!(renderer.errors().len(), 1);
        assert!(session.client().requests().is_empty());
        assert_eq!(session.state().messages(), &[Message::system("ctx")]);
    }

    #[tokio::test]
    async fn failed_regenerate_restores_the_turn() {
        let client = MockClient::replying(&["a1"]);
        client.push_error(Error::timeout("slow", Some(60.0)));
        let mut session = session(client);
        let mut renderer = RecordingRenderer::default();

        session.send("u1", &mut renderer).await.unwrap();
        let before = session.state().clone();
        let err = session.regenerate(&mut renderer).await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(session.state(), &before);
    }

    #[tokio::test]
    async fn clear_empties_history() {
        let mut session = session(MockClient::replying(&["a1", "a2"]));
        let mut console = ScriptedConsole::new(&["", "ctx", "u1", "u2", "/CLEAR", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert!(session.state().is_empty());
        assert!(renderer.lines.contains(&"info: Chat history cleared".to_string()));
    }

    #[tokio::test]
    async fn help_is_case_insensitive() {
        let mut outputs = Vec::new();
        for command in ["/help", "/HELP", "/Help"] {
            let mut session = session(MockClient::default());
            let mut console = ScriptedConsole::new(&[]);
            let mut renderer = RecordingRenderer::default();
            let flow = session
                .dispatch(command, &mut console, &mut renderer)
                .await
                .unwrap();
            assert_eq!(flow, Flow::Continue);
            outputs.push(renderer.lines);
        }
        assert!(!outputs[0].is_empty());
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);
    }

    #[tokio::test]
    async fn name_command_renames_unless_blank() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["Ada", "", "/name", "Grace", "/name", "", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert_eq!(session.state().display_name(), "Grace");
        assert_eq!(console.prompts.last().unwrap(), "Grace: ");
    }

    #[test]
    fn rename_keeps_name_on_whitespace() {
        let mut session = session(MockClient::default());
        session.rename("  Lin  ");
        assert_eq!(session.state().display_name(), "Lin");
        session.rename("   ");
        assert_eq!(session.state().display_name(), "Lin");
    }

    #[tokio::test]
    async fn image_uses_selected_size() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["a red cube", "2"]);
        let mut renderer = RecordingRenderer::default();

        let url = session
            .generate_image(&mut console, &mut renderer)
            .await
            .unwrap();

        assert_eq!(url.as_deref(), Some("https://images.example.com/512x512.png"));
        assert_eq!(
            session.client().images(),
            vec![("a red cube".to_string(), ImageSize::Medium)]
        );
        assert!(
            renderer
                .lines
                .contains(&"info: Image is ready! URL: https://images.example.com/512x512.png".to_string())
        );
    }

    #[tokio::test]
    async fn image_reprompts_until_valid_choice() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["a red cube", "x", "0", "3"]);
        let mut renderer = RecordingRenderer::default();

        session
            .generate_image(&mut console, &mut renderer)
            .await
            .unwrap();

        assert_eq!(
            console.prompts,
            vec![IMAGE_PROMPT, SIZE_PROMPT, SIZE_RETRY_PROMPT, SIZE_RETRY_PROMPT]
        );
        assert_eq!(session.client().images()[0].1, ImageSize::Large);
    }

    #[tokio::test]
    async fn image_cancel_makes_no_request() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["", "", "/image", "a red cube", "x", "stop", "/exit"]);
        let mut renderer = RecordingRenderer::default();

        session.run(&mut console, &mut renderer).await.unwrap();

        assert!(session.client().images().is_empty());
        assert!(renderer.errors().is_empty());
        assert!(renderer.lines.contains(&"info: Image generation canceled".to_string()));
        assert_eq!(session.phase(), SessionPhase::Terminated);
    }

    #[tokio::test]
    async fn image_end_of_input_cancels() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&["a red cube"]);
        let mut renderer = RecordingRenderer::default();

        let url = session
            .generate_image(&mut console, &mut renderer)
            .await
            .unwrap();

        assert!(url.is_none());
        assert!(session.client().images().is_empty());
    }

    #[tokio::test]
    async fn exit_returns_exit_flow() {
        let mut session = session(MockClient::default());
        let mut console = ScriptedConsole::new(&[]);
        let mut renderer = RecordingRenderer::default();

        let flow = session
            .dispatch("/Exit", &mut console, &mut renderer)
            .await
            .unwrap();

        assert_eq!(flow, Flow::Exit);
    }

    #[tokio::test]
    async fn unknown_slash_words_are_chat_text() {
        let mut session = session(MockClient::replying(&["sure"]));
        let mut console = ScriptedConsole::new(&[]);
        let mut renderer = RecordingRenderer::default();

        session
            .dispatch("/quit", &mut console, &mut renderer)
            .await
            .unwrap();

        assert_eq!(
            session.state().messages(),
            &[Message::user("/quit"), Message::assistant("sure")]
        );
    }
}
