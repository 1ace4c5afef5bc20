use ghd::app;
use ghd::cli;
use ghd::events;
use ghd::gh;
use ghd::poller::PollPolicy;
use ghd::runtime::Runtime;
use ghd::tui;

use app::AppState;
use clap::Parser;
use cli::Cli;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use events::{AppEvent, EventHandler};
use gh::client::{ActionsClient, Repository};
use gh::executor::GhClient;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::Duration;

const UI_TICK: Duration = Duration::from_millis(100);

fn setup_verbose_logging() -> Result<()> {
    let state_dir = state_dir();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    tracing::info!(
        "ghd v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn state_dir() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("ghd")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("ghd")
    } else {
        std::path::PathBuf::from("/tmp/ghd")
    }
}

async fn resolve_repo(arg: Option<&str>) -> Result<Repository> {
    match arg {
        Some(r) => r.parse().map_err(|e: String| eyre!(e)),
        None => GhClient::detect_repo().await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    // Startup validation happens before the terminal is taken over
    if let Err(e) = GhClient::check_available().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    let repo = match resolve_repo(args.repo.as_deref()).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let client = GhClient::new(args.limit);
    match client.sync_quota().await {
        Ok(remaining) => tracing::info!(remaining, "initial API quota"),
        Err(e) => tracing::warn!("could not read API quota, assuming default: {e}"),
    }
    let client: Arc<dyn ActionsClient> = Arc::new(client);

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle(format!("ghd {repo}")))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let events = EventHandler::new(UI_TICK);
    let policy = PollPolicy::with_fast_interval(Duration::from_secs(args.interval));
    let mut runtime = Runtime::new(client, repo.clone(), events.sender(), policy);
    let mut state = AppState::new(repo);

    let result = run_app(&mut terminal, &mut state, &mut runtime, events).await;

    runtime.shutdown();
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    runtime: &mut Runtime,
    mut events: EventHandler,
) -> Result<()> {
    let size = terminal.size()?;
    state.update(AppEvent::Resize {
        width: size.width,
        height: size.height,
    });
    let commands = state.init();
    runtime.execute(commands);

    loop {
        terminal.draw(|f| tui::render::render(f, &state.snapshot()))?;

        let Some(event) = events.next().await else {
            tracing::warn!("event channel closed");
            break;
        };
        let commands = state.update(event);
        runtime.execute(commands);

        if state.should_quit {
            break;
        }
    }

    events.stop();
    Ok(())
}
