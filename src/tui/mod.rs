pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::{resolve_theme, ThemeColors};

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::backend::cache::CacheConfig;
use crate::backend::error::Result as BackendResult;
use crate::backend::BackendClient;
use crate::fetch::{fetch_and_rank, Standings, View};
use crate::triggers::RefreshTriggers;

const TICK_RATE: Duration = Duration::from_millis(250);

type FetchHandle = JoinHandle<Result<BackendResult<Standings>, tokio::time::error::Elapsed>>;

fn spawn_fetch(client: &BackendClient, view: View, cache: &CacheConfig, timeout: Duration) -> FetchHandle {
    let client = client.clone();
    let cache = cache.clone();
    tokio::spawn(async move { tokio::time::timeout(timeout, fetch_and_rank(&client, view, &cache)).await })
}

/// Run the live view until the user quits.
///
/// Refresh triggers (timer, change feed, `r`) only mark the view dirty. At
/// most one fetch is in flight; triggers arriving meanwhile collapse into the
/// next one.
pub async fn run_tui(
    mut app: App,
    client: BackendClient,
    cache: CacheConfig,
    triggers: RefreshTriggers,
) -> anyhow::Result<()> {
    // Buffer log output while the TUI owns the terminal
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();

    let mut events = EventHandler::new(TICK_RATE, triggers);

    let mut pending_fetch: Option<FetchHandle> =
        Some(spawn_fetch(&client, app.view, &cache, app.request_timeout));
    app.is_loading = true;

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &mut app)) {
            break Err(e.into());
        }

        match events.next().await {
            Event::Key(key) => handle_key_event(&mut app, key),
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Refresh { trigger, live } => {
                debug!(?trigger, live, "refresh triggered");
                app.live = live;
                if !app.not_found {
                    app.needs_refresh = true;
                }
            }
        }

        if let Some(handle) = pending_fetch.take_if(|h| h.is_finished()) {
            match handle.await {
                Ok(Ok(Ok(standings))) => app.update_standings(standings),
                Ok(Ok(Err(e))) => app.fetch_failed(&e),
                Ok(Err(_elapsed)) => app.show_flash(format!(
                    "Refresh timed out ({}s). Will retry on next refresh.",
                    app.request_timeout.as_secs()
                )),
                Err(e) => app.show_flash(format!("Refresh task panicked: {}", e)),
            }
            app.is_loading = false;
        }

        if app.needs_refresh && pending_fetch.is_none() {
            app.needs_refresh = false;
            pending_fetch = Some(spawn_fetch(&client, app.view, &cache, app.request_timeout));
            app.is_loading = true;
        }

        if app.should_quit {
            break Ok(());
        }
    };

    if let Some(handle) = pending_fetch.take() {
        handle.abort();
    }
    events.shutdown().await;

    ratatui::restore();

    // Flush buffered log lines now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    result
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        app::InputMode::Normal => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.should_quit = true,

            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),

            KeyCode::Enter | KeyCode::Char('o') => app.open_page(),

            KeyCode::Char('r') if !app.not_found => {
                app.needs_refresh = true;
                app.show_flash("Refreshing...".to_string());
            }

            KeyCode::Char('?') => app.show_help(),

            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ThemeMode};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let config = Config {
            theme: ThemeMode::Dark,
            ..Default::default()
        };
        App::new_loading(View::Board(1), &config, false)
    }

    #[test]
    fn test_refresh_key_marks_dirty() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('r')));
        assert!(app.needs_refresh);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert_eq!(app.input_mode, app::InputMode::Help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert_eq!(app.input_mode, app::InputMode::Normal);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
