use clap::Parser;
use color_eyre::eyre;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use neuratalk::app::{Action, App};
use neuratalk::config::Config;
use neuratalk::logging::init_logging;
use neuratalk::ollama::OllamaClient;
use neuratalk::session::{SessionContext, SessionEvent};
use neuratalk::transcript::FileTranscriptStore;
use neuratalk::ui::ui;

/// Chat with local Ollama models in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where transcripts and snapshots are kept
    #[arg(long)]
    conversations_dir: Option<PathBuf>,

    /// Open a chat with this model on startup
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Err(e) = init_logging() {
        eprintln!("Warning: logging disabled: {e}");
    }

    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => Config::load_from(path),
        None => Ok(Config::default()),
    }
    .map_err(|e| eyre::eyre!("loading settings: {e:#}"))?;
    if let Some(dir) = args.conversations_dir {
        config.conversations_dir = Some(dir);
    }

    let root = config.conversations_root();
    info!(root = %root.display(), url = %config.ollama_url, "Starting NeuraTalk");

    let (action_tx, mut action_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let ctx = SessionContext {
        generator: Arc::new(OllamaClient::new(config.ollama_url.clone())),
        store: Arc::new(FileTranscriptStore::new(root)),
        events: event_tx,
    };
    let mut app = App::new(action_tx.clone(), config, ctx, config_path);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Input handling task
    let input_handle = {
        let tx = action_tx.clone();
        tokio::spawn(async move {
            loop {
                match event::poll(std::time::Duration::from_millis(100)) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            let _ = tx.send(Action::UserInput(key));
                        }
                        Ok(Event::Mouse(mouse)) => match mouse.kind {
                            MouseEventKind::ScrollUp => {
                                let _ = tx.send(Action::Scroll(-3));
                            }
                            MouseEventKind::ScrollDown => {
                                let _ = tx.send(Action::Scroll(3));
                            }
                            _ => {}
                        },
                        Ok(Event::Resize(w, h)) => {
                            let _ = tx.send(Action::Resize(w, h));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            let _ = tx.send(Action::Error(format!("Input error: {e}")));
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        let _ = tx.send(Action::Error(format!("Input error: {e}")));
                        break;
                    }
                }
            }
        })
    };

    // Initial load
    let _ = action_tx.send(Action::LoadModels);
    if let Some(model) = args.model {
        let _ = action_tx.send(Action::OpenChat(model));
    }

    let res = run_app(&mut terminal, &mut app, &mut action_rx, &mut event_rx).await;

    // Restore
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    input_handle.abort();
    let _ = io::stdout().flush();

    if let Err(err) = &res {
        error!(error = %err, "Exited with error");
    }
    info!("Exiting");
    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<'_>,
    action_rx: &mut mpsc::UnboundedReceiver<Action>,
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
) -> eyre::Result<()> {
    let mut last_tick = std::time::Instant::now();
    let tick_rate = std::time::Duration::from_millis(100);

    terminal.draw(|f| ui(f, app))?;

    loop {
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| std::time::Duration::from_secs(0));

        tokio::select! {
            Some(action) = action_rx.recv() => {
                match action {
                    Action::Render => {
                        terminal.draw(|f| ui(f, app))?;
                    }
                    Action::Resize(_, _) => {
                        terminal.autoresize()?;
                        terminal.draw(|f| ui(f, app))?;
                    }
                    Action::Quit => return Ok(()),
                    _ => {
                        if app.update(action).await {
                            terminal.draw(|f| ui(f, app))?;
                        }
                    }
                }
            }
            Some(event) = event_rx.recv() => {
                if app.handle_session_event(event) {
                    terminal.draw(|f| ui(f, app))?;
                }
            }
            _ = tokio::time::sleep(timeout) => {
                if app.loading || app.is_generating() {
                    app.spinner_state.calc_next();
                    terminal.draw(|f| ui(f, app))?;
                }
                last_tick = std::time::Instant::now();
            }
        }
    }
}
