//! Chat application module for interactive conversations.
//!
//! This module provides the REPL chat interface built on top of the
//! termchat client.  It supports:
//!
//! - A linear chat history sent in full with every request
//! - Slash commands for session control (`/clear`, `/image`, `/help`,
//!   `/name`, `/regenerate`, `/exit`)
//! - Image generation with an interactive size menu
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`state`]: History and display name, free of I/O
//! - [`commands`]: Slash command parsing
//! - [`console`]: Line input, injectable for tests
//! - [`session`]: Command dispatch and the session loop

mod commands;
mod config;
mod console;
mod session;
mod state;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_entries, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use console::{Console, RustylineConsole};
pub use session::{CANCEL_TOKEN, ChatSession, Flow, SessionPhase};
pub use state::{DEFAULT_DISPLAY_NAME, SessionState};
