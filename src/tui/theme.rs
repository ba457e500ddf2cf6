//! Color palettes for the live view

use ratatui::prelude::*;

use crate::config::ThemeMode;

/// Complete color palette for the TUI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Podium
    pub gold: Color,
    pub silver: Color,
    pub bronze: Color,

    // Table
    pub row_alt_bg: Color,
    pub rank_color: Color,
    pub score_color: Color,
    pub header_style: Style,
    pub row_selected: Style,

    // General
    pub muted: Color,
    pub title_color: Color,
    pub error: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Feed indicator
    pub live: Color,
    pub polling: Color,

    // Popups
    pub popup_border: Color,
    pub popup_title: Style,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            gold: Color::Rgb(255, 204, 0),
            silver: Color::Rgb(192, 192, 192),
            bronze: Color::Rgb(205, 127, 50),
            row_alt_bg: Color::Indexed(235),
            rank_color: Color::DarkGray,
            score_color: Color::White,
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            error: Color::Red,
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            live: Color::Green,
            polling: Color::Yellow,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
        }
    }

    pub fn light() -> Self {
        Self {
            gold: Color::Rgb(184, 134, 11),
            silver: Color::Rgb(112, 112, 112),
            bronze: Color::Rgb(139, 69, 19),
            row_alt_bg: Color::Indexed(254),
            rank_color: Color::Gray,
            score_color: Color::Black,
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::DarkGray,
            title_color: Color::Blue,
            error: Color::Red,
            status_bar_bg: Color::Indexed(253),
            status_key_color: Color::Blue,
            flash_success: Color::Rgb(0, 128, 0),
            flash_error: Color::Red,
            live: Color::Rgb(0, 128, 0),
            polling: Color::Rgb(176, 112, 0),
            popup_border: Color::Blue,
            popup_title: Style::new().fg(Color::Blue).bold(),
        }
    }

    /// Highlight for the top three places, `None` below the podium
    pub fn podium_style(&self, rank: usize) -> Option<Style> {
        let color = match rank {
            1 => self.gold,
            2 => self.silver,
            3 => self.bronze,
            _ => return None,
        };
        Some(Style::new().fg(color).bold())
    }
}

/// Pick the palette. `Auto` asks the terminal for its background luma and
/// falls back to dark when the terminal does not answer.
pub fn resolve_theme(mode: ThemeMode) -> ThemeColors {
    match mode {
        ThemeMode::Dark => ThemeColors::dark(),
        ThemeMode::Light => ThemeColors::light(),
        ThemeMode::Auto => match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => ThemeColors::light(),
            _ => ThemeColors::dark(),
        },
    }
}
