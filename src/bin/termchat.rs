//! Interactive terminal chat client.
//!
//! This binary provides a REPL for chatting with an OpenAI-compatible model
//! and generating images.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage; the API key comes from OPENAI_API_KEY
//! termchat
//!
//! # Use another model or endpoint
//! termchat --model gpt-4o --base-url http://localhost:8080/v1
//!
//! # Disable colors (useful for piping output)
//! termchat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/image` - Generate an image
//! - `/name` - Change your name
//! - `/regenerate` - Regenerate the last response
//! - `/exit` - Exit the application
//!
//! Set `RUST_LOG=debug` to see request logging on stderr.

use arrrg::CommandLine;

use termchat::OpenAi;
use termchat::chat::{ChatArgs, ChatConfig, ChatSession, PlainTextRenderer, RustylineConsole};

/// Main entry point for the termchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    termchat::register_biometrics(biometrics::Collector::new());

    let (args, _) = ChatArgs::from_command_line_relaxed("termchat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = OpenAi::with_options(None, config.base_url.clone(), Some(config.timeout))?;
    log::info!("using {} at {}", config.model, client.base_url());

    let mut session = ChatSession::new(client, config);
    let mut console = RustylineConsole::new(use_color)?;
    let mut renderer = PlainTextRenderer::with_color(use_color);

    session.run(&mut console, &mut renderer).await?;
    Ok(())
}
