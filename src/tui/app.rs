use chrono::{DateTime, Utc};
use num_format::Locale;
use std::time::{Duration, Instant};

use crate::backend::BackendError;
use crate::config::Config;
use crate::fetch::{Standings, View};
use crate::output::resolve_locale;
use crate::tui::theme::{resolve_theme, ThemeColors};

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    Help,
}

pub struct App {
    pub view: View,
    pub standings: Option<Standings>,
    pub table_state: ratatui::widgets::TableState,
    pub input_mode: InputMode,
    pub flash_message: Option<(String, Instant)>,
    /// When the shown standings were fetched
    pub last_refresh: Option<DateTime<Utc>>,
    /// Standings come from the snapshot cache and have not been confirmed yet
    pub stale: bool,
    pub not_found: bool,
    pub live: bool,
    pub needs_refresh: bool,
    pub should_quit: bool,
    pub is_loading: bool,
    pub spinner_frame: usize,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub site_url: Option<String>,
    pub locale: Locale,
    pub theme: ThemeColors,
}

impl App {
    /// Create an App with no standings yet, in loading state
    pub fn new_loading(view: View, config: &Config, live: bool) -> Self {
        Self {
            view,
            standings: None,
            table_state: ratatui::widgets::TableState::default(),
            input_mode: InputMode::Normal,
            flash_message: None,
            last_refresh: None,
            stale: false,
            not_found: false,
            live,
            needs_refresh: false,
            should_quit: false,
            is_loading: true,
            spinner_frame: 0,
            refresh_interval: config.refresh_period(),
            request_timeout: config.request_timeout(),
            site_url: config.site_url.clone(),
            locale: resolve_locale(&config.locale),
            theme: resolve_theme(config.theme),
        }
    }

    /// Show the last-known standings until the first fetch lands
    pub fn with_last_known(mut self, saved_at: DateTime<Utc>, standings: Standings) -> Self {
        self.standings = Some(standings);
        self.last_refresh = Some(saved_at);
        self.stale = true;
        self.clamp_selection();
        self
    }

    pub fn row_count(&self) -> usize {
        self.standings.as_ref().map_or(0, Standings::len)
    }

    pub fn title(&self) -> String {
        match (&self.standings, self.view) {
            (Some(standings), _) => standings.title(),
            (None, View::Golf) => "Code Golf Leaderboard".to_string(),
            (None, View::Board(id)) => format!("Leaderboard {}", id),
        }
    }

    pub fn next_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    /// Id of the selected row, used to keep the cursor on the same team across refreshes
    fn selected_id(&self) -> Option<String> {
        let selected = self.table_state.selected()?;
        match self.standings.as_ref()? {
            Standings::Board { entries, .. } => entries.get(selected).map(|r| r.item.id.clone()),
            Standings::Golf { submissions } => submissions.get(selected).map(|r| r.item.id.clone()),
        }
    }

    fn position_of(&self, id: &str) -> Option<usize> {
        match self.standings.as_ref()? {
            Standings::Board { entries, .. } => entries.iter().position(|r| r.item.id == id),
            Standings::Golf { submissions } => submissions.iter().position(|r| r.item.id == id),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.row_count();
        if len == 0 {
            self.table_state.select(None);
        } else {
            let i = self.table_state.selected().unwrap_or(0).min(len - 1);
            self.table_state.select(Some(i));
        }
    }

    /// Replace the shown standings with a fresh result
    pub fn update_standings(&mut self, standings: Standings) {
        let previous = self.selected_id();

        self.standings = Some(standings);
        self.not_found = false;
        self.stale = false;
        self.last_refresh = Some(Utc::now());

        match previous.and_then(|id| self.position_of(&id)) {
            Some(pos) => self.table_state.select(Some(pos)),
            None => self.clamp_selection(),
        }
    }

    /// A fetch failed. A missing board is terminal; anything else keeps the
    /// last good state and reports the failure.
    pub fn fetch_failed(&mut self, err: &BackendError) {
        if err.is_not_found() && matches!(self.view, View::Board(_)) {
            self.not_found = true;
            self.standings = None;
            self.table_state.select(None);
        } else {
            self.show_flash(format!("Refresh failed: {}", err));
        }
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    /// Web page of the current board, if a site is configured
    pub fn page_url(&self) -> Option<String> {
        match self.view {
            View::Board(id) => self
                .site_url
                .as_deref()
                .map(|site| crate::browser::board_url(site, id)),
            View::Golf => None,
        }
    }

    pub fn open_page(&mut self) {
        match self.page_url() {
            Some(url) => match crate::browser::open_url(&url) {
                Ok(()) => self.show_flash(format!("Opened: {}", url)),
                Err(e) => self.show_flash(format!("Failed to open browser: {}", e)),
            },
            None if self.view == View::Golf => {
                self.show_flash("Code golf has no board page".to_string())
            }
            None => self.show_flash("Failed to open: site_url is not configured".to_string()),
        }
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Advance the loading spinner animation frame
    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{Entry, Leaderboard};
    use crate::fetch::{rank_rows, Rows};
    use crate::ranking::ScoringPolicy;
    use chrono::TimeZone;

    fn entry(id: &str, score: f64, t: i64) -> Entry {
        Entry {
            id: id.to_string(),
            leaderboard_id: 1,
            team_name: format!("team-{}", id),
            score,
            metadata: Default::default(),
            created_at: Utc.timestamp_opt(1_700_000_000 + t, 0).unwrap(),
            updated_at: None,
        }
    }

    fn standings(entries: Vec<Entry>) -> Standings {
        rank_rows(Rows::Board {
            leaderboard: Leaderboard {
                id: 1,
                name: "Finals".to_string(),
                description: None,
                scoring_type: ScoringPolicy::PointsHigh,
                score_label: "Points".to_string(),
                allow_updates: true,
                is_active: true,
                created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            },
            entries,
        })
    }

    fn app() -> App {
        let config = Config {
            theme: crate::config::ThemeMode::Dark,
            site_url: Some("https://scores.example.com".to_string()),
            ..Default::default()
        };
        App::new_loading(View::Board(1), &config, true)
    }

    #[test]
    fn test_selection_follows_team_across_refresh() {
        let mut app = app();
        app.update_standings(standings(vec![entry("a", 10.0, 1), entry("b", 5.0, 2)]));
        app.next_row();
        assert_eq!(app.selected_id().as_deref(), Some("b"));

        // b overtakes a
        app.update_standings(standings(vec![entry("a", 10.0, 1), entry("b", 50.0, 2)]));
        assert_eq!(app.table_state.selected(), Some(0));
        assert_eq!(app.selected_id().as_deref(), Some("b"));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();
        app.update_standings(standings(vec![entry("a", 3.0, 1), entry("b", 2.0, 2), entry("c", 1.0, 3)]));
        assert_eq!(app.table_state.selected(), Some(0));
        app.previous_row();
        assert_eq!(app.table_state.selected(), Some(2));
        app.next_row();
        assert_eq!(app.table_state.selected(), Some(0));
    }

    #[test]
    fn test_failure_keeps_last_state() {
        let mut app = app();
        app.update_standings(standings(vec![entry("a", 3.0, 1)]));
        app.fetch_failed(&BackendError::Status {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(app.row_count(), 1);
        assert!(app.flash_message.as_ref().unwrap().0.starts_with("Refresh failed"));
        assert!(!app.not_found);
    }

    #[test]
    fn test_missing_board_is_terminal() {
        let mut app = app();
        app.update_standings(standings(vec![entry("a", 3.0, 1)]));
        app.fetch_failed(&BackendError::NotFound("Leaderboard 1".to_string()));
        assert!(app.not_found);
        assert_eq!(app.row_count(), 0);
        assert_eq!(app.table_state.selected(), None);
    }

    #[test]
    fn test_last_known_is_marked_stale_until_refresh() {
        let saved = Utc.timestamp_opt(1_700_000_500, 0).unwrap();
        let mut app = app().with_last_known(saved, standings(vec![entry("a", 1.0, 1)]));
        assert!(app.stale);
        assert_eq!(app.last_refresh, Some(saved));
        assert_eq!(app.title(), "Finals");

        app.update_standings(standings(vec![entry("a", 1.0, 1)]));
        assert!(!app.stale);
    }

    #[test]
    fn test_page_url() {
        let app = app();
        assert_eq!(app.page_url().as_deref(), Some("https://scores.example.com/1/leaderboard"));
    }
}
