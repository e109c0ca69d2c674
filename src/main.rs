mod action;
mod app;
mod auth;
mod backend;
mod config;
mod error;
mod feed;
mod pager;
mod rest;
mod tui;
mod types;
mod ui;

use std::io::BufRead;
use std::panic;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::auth::Session;
use crate::config::Config;
use crate::error::DeckError;
use crate::rest::RestBackend;
use crate::tui::{Event, EventHandler};
use crate::types::Tab;

const PASSWORD_ENV: &str = "PROMPTDECK_PASSWORD";

#[derive(Parser)]
#[command(name = "promptdeck", version, about = "Browse a shared prompt library from the terminal")]
struct Cli {
    /// API base URL, overriding the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Tab to open on start
    #[arg(long, value_enum, default_value = "browse")]
    tab: StartTab,

    /// Open the prompts of one author instead of a tab
    #[arg(long, conflicts_with = "tab")]
    author: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        username: String,
    },
    /// Forget the stored session
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StartTab {
    Browse,
    Mine,
    Pending,
    Approved,
}

impl Cli {
    fn start_tab(&self) -> Tab {
        if let Some(author) = &self.author {
            return Tab::Author(author.clone());
        }
        match self.tab {
            StartTab::Browse => Tab::Browse,
            StartTab::Mine => Tab::Mine,
            StartTab::Pending => Tab::Pending,
            StartTab::Approved => Tab::Approved,
        }
    }
}

/// Log to a file in the cache dir so output does not tear the TUI.
fn init_logging() {
    let log_file = dirs::cache_dir()
        .map(|dir| dir.join("promptdeck"))
        .and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("promptdeck.log"))
                .ok()
        });

    let (writer, ansi) = match log_file {
        Some(file) => (BoxMakeWriter::new(Mutex::new(file)), false),
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi),
        )
        .init();
}

fn read_password() -> Result<String, DeckError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        if !password.is_empty() {
            return Ok(password);
        }
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(DeckError::Auth("empty password".to_string()));
    }
    Ok(password)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(url) = &cli.api_url {
        config.server.api_url = config::base_url(url)?;
    }

    match &cli.command {
        Some(Command::Login { username }) => {
            let password = read_password()?;
            let client = reqwest::Client::new();
            let tokens =
                auth::login(&client, &config.server.api_url, username, &password).await?;
            Session::load().store(tokens)?;
            println!("Logged in as {}", username);
            return Ok(());
        }
        Some(Command::Logout) => {
            Session::load().clear()?;
            tracing::info!("logged out");
            println!("Logged out");
            return Ok(());
        }
        None => {}
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let session = Arc::new(Session::load());
    if !session.is_authenticated() {
        tracing::info!("no stored session, browsing anonymously");
    }
    let backend = RestBackend::new(
        config.server.api_url.clone(),
        config.server.web_url.clone(),
        session,
    );

    let result = run(Arc::new(backend), config, cli.start_tab()).await;

    tui::restore()?;

    result
}

async fn run(
    backend: Arc<RestBackend>,
    config: Config,
    start_tab: Tab,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(backend, config.paging, start_tab, action_tx.clone());
    app.start();

    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if let Some(document) = app.take_pager_request() {
            events.stop();
            tui::restore()?;
            let result = pager::open_pager(&document, &pager::detect_pager());
            terminal = tui::init()?;
            terminal.clear()?;
            tui::drain_events();
            events = EventHandler::new(tick_rate, render_rate);
            if let Err(e) = result {
                app.update(Action::Error(format!("Pager failed: {}", e)));
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_browse() {
        let cli = Cli::parse_from(["promptdeck"]);
        assert_eq!(cli.start_tab(), Tab::Browse);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_author_tab() {
        let cli = Cli::parse_from(["promptdeck", "--author", "bo"]);
        assert_eq!(cli.start_tab(), Tab::Author("bo".into()));
    }

    #[test]
    fn cli_login_subcommand() {
        let cli = Cli::parse_from([
            "promptdeck",
            "--api-url",
            "http://x/api",
            "login",
            "--username",
            "ana",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
        assert!(matches!(cli.command, Some(Command::Login { ref username }) if username == "ana"));
    }

    #[test]
    fn cli_review_tab() {
        let cli = Cli::parse_from(["promptdeck", "--tab", "pending"]);
        assert_eq!(cli.start_tab(), Tab::Pending);
    }
}
