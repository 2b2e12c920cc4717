//! chatline terminal client
//!
//! - Commands on stdin: `/connect [host:port] [name]`, `/disconnect`, `/users`,
//!   `/theme <light|dark>`, `/quit`
//! - Any other line is sent as chat (`/w <user> <message>` for private messages)
//! - UI events printed to stdout; logs go to stderr (`RUST_LOG`)
//! - Config from `chatline.yaml` or `$CHATLINE_CONFIG`, defaults when absent;
//!   `/theme` writes the choice back to that file

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use chatline_client::config::{self, Theme};
use chatline_client::history::load_history;
use chatline_client::{AppState, EventSink, SessionController, UiEvent};
use chatline_core::error::{ChatError, Result};

const DEFAULT_CONFIG: &str = "chatline.yaml";

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), err = %e, "chatline exited with error");
        std::process::exit(1);
    }
}

/// Single UI context: owns the rendered user list and the theme.
struct View {
    theme: Theme,
    users: Vec<String>,
}

impl View {
    fn apply(&mut self, ev: UiEvent) {
        match ev {
            UiEvent::ChatLine(line) => self.print(&line),
            UiEvent::TypingShown(text) => self.print(&format!("... {text}")),
            UiEvent::TypingCleared => {}
            UiEvent::UserList(users) => {
                if !users.is_empty() {
                    self.print(&format!("[users] {}", users.join(", ")));
                }
                self.users = users;
            }
            UiEvent::State(state) => tracing::info!(%state, "connection state"),
        }
    }

    fn print(&self, line: &str) {
        match self.theme {
            Theme::Light => println!("{line}"),
            Theme::Dark => println!("\x1b[97;40m{line}\x1b[0m"),
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("CHATLINE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = config::load_or_default(&path)?;
    let mut saved = cfg.clone();

    let default_address = cfg.server.address.clone();
    let default_username = cfg.client.username.clone().unwrap_or_default();
    let mut view = View {
        theme: cfg.ui.theme,
        users: Vec::new(),
    };

    if let Some(history) = cfg.client.history_path.as_deref() {
        for line in load_history(history).await? {
            view.print(&line);
        }
    }

    let app = AppState::new(cfg)?;
    let (events, mut rx) = EventSink::channel();
    let controller = SessionController::new(app, events);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            ev = rx.recv() => match ev {
                Some(ev) => view.apply(ev),
                None => break,
            },
            line = lines.next_line() => {
                let line = line.map_err(|e| ChatError::Internal(format!("stdin: {e}")))?;
                let Some(line) = line else { break; };
                let mut args = line.split_whitespace();
                match args.next() {
                    Some("/quit") => break,
                    Some("/connect") => {
                        let address = args.next().unwrap_or(&default_address);
                        let username = args.next().unwrap_or(&default_username);
                        // failures are already reported as system lines
                        if let Err(e) = controller.connect(address, username).await {
                            if matches!(
                                e,
                                ChatError::BlankUsername
                                    | ChatError::InvalidAddress(_)
                                    | ChatError::AlreadyConnected
                            ) {
                                view.print(&format!("[system] {e}"));
                            }
                        }
                    }
                    Some("/theme") => match args.next().unwrap_or_default().parse::<Theme>() {
                        Ok(theme) => {
                            view.theme = theme;
                            saved.ui.theme = theme;
                            match config::save_to_file(&path, &saved) {
                                Ok(()) => view.print(&format!("[system] Theme set to {theme}")),
                                Err(e) => {
                                    tracing::warn!(path = %path, err = %e, "theme not saved");
                                    view.print(&format!("[system] Theme not saved: {e}"));
                                }
                            }
                        }
                        Err(e) => view.print(&format!("[system] {e}")),
                    },
                    Some("/disconnect") => controller.disconnect().await,
                    Some("/users") => view.print(&format!("[users] {}", view.users.join(", "))),
                    _ => {
                        if let Err(e) = controller.send(&line).await {
                            tracing::debug!(err = %e, "send failed");
                        }
                    }
                }
            }
        }
    }

    controller.disconnect().await;
    while let Ok(ev) = rx.try_recv() {
        view.apply(ev);
    }
    Ok(())
}
