//! Codebase Chat - terminal client for a question-answering service
//!
//! Keeps a single conversation with a remote service that answers questions
//! about a codebase. Questions are sent one at a time; the input line is
//! disabled until the current answer (or error) comes back.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod answering;
mod config;
mod conversation;
mod core;
mod tui;
mod ui;

use answering::HttpAnswerer;
use config::Config;
use crate::core::{ConversationSession, Dispatcher, SessionOptions};
use tui::{EventHandler, Tui};
use ui::{AppController, ChatApp};

const TICK_RATE_MS: u64 = 250;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_file)?;

    let answerer = Arc::new(HttpAnswerer::from_config(&config.client.api)?);
    tracing::info!("💬 Answering service at {}", answerer.chat_url());

    // Probe in the background; the UI starts regardless of the result
    let probe = Arc::clone(&answerer);
    tokio::spawn(async move {
        match probe.check_connection().await {
            Ok(message) => tracing::info!("Answering service reachable: {}", message),
            Err(e) => tracing::warn!("Answering service check failed: {}", e),
        }
    });

    let mut events = EventHandler::new(TICK_RATE_MS);
    let dispatcher = Dispatcher::new(answerer, events.sender());
    let session = ConversationSession::new(SessionOptions::from_config(&config.client.session));
    let mut app = ChatApp::new(session, dispatcher, config.client.ui.clone());

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    tracing::info!(
        session_id = %app.session().id(),
        messages = app.session().transcript().len(),
        "Session closed"
    );
    result
}

async fn run(terminal: &mut Tui, app: &mut ChatApp, events: &mut EventHandler) -> anyhow::Result<()> {
    terminal.draw(|f| app.render(f))?;

    while let Some(action) = events.next().await {
        app.update(action);
        if app.should_quit() {
            break;
        }
        terminal.draw(|f| app.render(f))?;
    }

    Ok(())
}

/// Log to a file; the terminal belongs to the UI
fn init_tracing(path: &Path) -> anyhow::Result<()> {
    let log_file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codebase_chat=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    Ok(())
}
