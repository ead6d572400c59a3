use std::io;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;

use feedlens_core::{Aggregator, AppConfig, FetchConfig, ProgressEvent};
use feedlens_tui::{
    app::App,
    event::{AppEvent, EventHandler, RefreshResult},
    input::{apply_action, handle_key_event},
    widgets::{ArticleListWidget, FeedListWidget, StatusBarWidget},
    Theme,
};

pub async fn run(config: Arc<AppConfig>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle("feedlens"))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, config).await;

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Arc<AppConfig>,
) -> Result<()> {
    let mut app = App::new(config.clone(), Theme::default());
    let event_handler = EventHandler::new(config.ui.tick_rate_ms);

    // Progress events and finished runs arrive from the background task
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<RefreshResult>();

    if let Some(fetch_config) = app.begin_refresh() {
        spawn_refresh(fetch_config, progress_tx.clone(), refresh_tx.clone());
    }

    loop {
        while let Ok(event) = progress_rx.try_recv() {
            app.apply_progress(&event);
        }

        while let Ok(result) = refresh_rx.try_recv() {
            match result {
                RefreshResult::Success { articles } => {
                    // Events sent just before the result may still be queued
                    while let Ok(event) = progress_rx.try_recv() {
                        app.apply_progress(&event);
                    }
                    app.finish_refresh(articles);
                }
                RefreshResult::Failure { error } => app.fail_refresh(&error),
            }
        }

        terminal.draw(|frame| {
            let size = frame.area();

            // Main layout: content + status bar
            let main_layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(size);

            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 4), Constraint::Ratio(3, 4)])
                .split(main_layout[0]);

            FeedListWidget::render(frame, columns[0], &app);
            ArticleListWidget::render(frame, columns[1], &app);
            StatusBarWidget::render(frame, main_layout[1], &app);
        })?;

        if let Some(event) = event_handler.next()? {
            match event {
                AppEvent::Key(key) => {
                    let action = handle_key_event(key, &app);
                    if apply_action(&mut app, action) {
                        if let Some(fetch_config) = app.begin_refresh() {
                            spawn_refresh(fetch_config, progress_tx.clone(), refresh_tx.clone());
                        }
                    }
                }
                AppEvent::Resize(_, _) => {}
                AppEvent::Tick => app.tick_spinner(),
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Run one aggregation on the runtime; the UI keeps drawing meanwhile.
/// A result is always sent, so the UI never stays stuck in the fetching state.
fn spawn_refresh(
    fetch_config: FetchConfig,
    progress_tx: mpsc::UnboundedSender<ProgressEvent>,
    refresh_tx: mpsc::UnboundedSender<RefreshResult>,
) {
    tokio::spawn(async move {
        let run = tokio::spawn(async move {
            match Aggregator::new(&fetch_config) {
                Ok(aggregator) => RefreshResult::Success {
                    articles: aggregator.fetch_all(&fetch_config, &progress_tx).await,
                },
                Err(e) => {
                    tracing::error!("Failed to start refresh: {}", e);
                    RefreshResult::Failure { error: e.to_string() }
                }
            }
        });

        let result = run.await.unwrap_or_else(|e| {
            tracing::error!("Refresh task aborted: {}", e);
            RefreshResult::Failure { error: e.to_string() }
        });

        if refresh_tx.send(result).is_err() {
            tracing::debug!("UI closed before refresh finished");
        }
    });
}
