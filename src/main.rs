mod app;
mod ui;

use std::{io, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use app::App;
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use rugby_tracker::config::Args;
use rugby_tracker::data::{self, DataClient, SyncStatus};
use rugby_tracker::roster::default_lineup;
use rugby_tracker::ticker::ClockPulse;
use rugby_tracker::{telemetry, MatchSession, MemoryStore, StatRegistry};
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init(&args.log_file)?;

    let client = args.server.as_ref().map(|url| Arc::new(DataClient::new(url.as_str())));
    let club = match &client {
        Some(client) => client
            .fetch_club(args.team)
            .await
            .context("fetching club data from server")?,
        None => data::load_club_file(&args.data)?,
    };

    let fixture = club.fixture(args.fixture, Utc::now()).cloned();
    if let (Some(wanted), None) = (args.fixture, &fixture) {
        anyhow::bail!("fixture {wanted} is not in the club data");
    }
    let opponent = fixture
        .as_ref()
        .map(|f| f.opponent.clone())
        .unwrap_or_else(|| "Opposition".to_string());
    let match_id = args.match_id.or(fixture.as_ref().map(|f| f.id)).unwrap_or(1);

    let lineup = if club.lineup.is_empty() {
        default_lineup(&club.players)
    } else {
        club.lineup.clone()
    };
    let registry = if club.stat_types.is_empty() {
        StatRegistry::standard()
    } else {
        StatRegistry::new(club.stat_types)
    };
    let session = MatchSession::new(
        match_id,
        club.team,
        opponent,
        club.players,
        registry,
        args.clock()?,
        MemoryStore::new(),
    );
    info!(match_id, opponent = %session.opponent(), "match session ready");

    // Setup channels for clock pulses and server sync results
    let (pulse_tx, mut pulse_rx) = mpsc::channel::<ClockPulse>(64);
    let (status_tx, mut status_rx) = mpsc::channel::<SyncStatus>(64);
    let sync_tx = client.map(|client| {
        let (tx, rx) = mpsc::channel(256);
        data::spawn_sync(client, rx, status_tx.clone());
        tx
    });

    let mut app = App::new(session, args.tick_interval(), pulse_tx, sync_tx);
    app.assign_lineup(&lineup);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &mut pulse_rx, &mut status_rx).await;
    app.stop_ticker();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Some(path) = &args.summary {
        let summary = serde_json::to_string_pretty(&app.session.summary())?;
        std::fs::write(path, summary).with_context(|| format!("writing summary to {}", path.display()))?;
        info!(path = %path.display(), "match summary written");
    }

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    pulse_rx: &mut mpsc::Receiver<ClockPulse>,
    status_rx: &mut mpsc::Receiver<SyncStatus>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code);
                }
            }
        }

        while let Ok(pulse) = pulse_rx.try_recv() {
            app.on_pulse(pulse);
        }
        while let Ok(status) = status_rx.try_recv() {
            app.on_sync_status(status);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
