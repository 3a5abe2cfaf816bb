//! Terminal departure board that polls the SNCF journey planner and shows the next trains.

mod app;
mod input;
mod ui;

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration as StdDuration,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use quai_core::{BoardConfig, PollScheduler};
use quai_provider_sncf as sncf;
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::input::Action;

/// Upper bound for a single journeys request.
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "quai", version, about = "Departure board for the SNCF journey planner")]
struct Args {
    /// Board configuration (JSON).
    #[arg(short, long, env = "QUAI_CONFIG", default_value = "quai.json")]
    config: PathBuf,

    /// API key, overrides `apiKey` from the configuration.
    #[arg(long, env = "SNCF_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Where to write logs while the board owns the terminal.
    #[arg(long, default_value = "quai.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration
    let raw = fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let mut config = BoardConfig::from_json(&raw)?;
    if let Some(api_key) = args.api_key {
        config.api_key = Some(api_key);
    }
    config.validate()?;

    init_tracing(&args.log_file, config.debugging)?;
    info!(config = %args.config.display(), "configuration loaded");

    // HTTP + provider setup
    let client = Client::builder()
        .user_agent("quai/0.1")
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let port = sncf::port(client, config.date_pattern());

    // Config in, records out
    let (config_tx, config_rx) = mpsc::channel(1);
    let (events_tx, events_rx) = mpsc::channel(8);
    let app = App::new(&config, events_rx);

    config_tx.send(config).await?;
    let scheduler = PollScheduler::new(port, events_tx)
        .start_from(config_rx)
        .await?;

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    scheduler.stopped().await;
    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        app.receive_updates();
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (small timeout so fresh records show up promptly)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
            }
        }
    }

    Ok(())
}

fn init_tracing(path: &Path, debugging: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let default_level = if debugging { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
