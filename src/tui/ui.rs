use chrono::Utc;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table};

use crate::fetch::Standings;
use crate::output::{format_duration, format_relative_age, format_score, rank_badge, truncate_text};
use crate::tui::app::{App, InputMode};

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 6 || area.width < 30 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Subtitle(1) + Table(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_subtitle(frame, chunks[1], app);
    render_body(frame, chunks[2], app);
    render_status_bar(frame, chunks[3], app);

    if app.input_mode == InputMode::Help {
        render_help_popup(frame, app);
    }

    if app.is_loading && app.standings.is_none() && !app.not_found {
        render_loading_overlay(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let title = app.title();
    let (indicator, color) = if app.live {
        ("● Live", app.theme.live)
    } else {
        ("○ Polling", app.theme.polling)
    };

    let padding = (area.width as usize).saturating_sub(title.chars().count() + indicator.chars().count());
    let line = Line::from(vec![
        Span::styled(title, Style::default().fg(app.theme.title_color).bold()),
        Span::raw(" ".repeat(padding)),
        Span::styled(indicator, Style::default().fg(color)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_subtitle(frame: &mut Frame, area: Rect, app: &App) {
    let text = match &app.standings {
        Some(Standings::Board { leaderboard, .. }) => match &leaderboard.description {
            Some(desc) => format!("{} · {}", leaderboard.scoring_type.describe(), desc),
            None => leaderboard.scoring_type.describe().to_string(),
        },
        Some(Standings::Golf { .. }) => "Fizz Buzz · shortest code wins, fastest solve breaks ties".to_string(),
        None => String::new(),
    };
    let text = truncate_text(&text, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(app.theme.muted)),
        area,
    );
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.not_found {
        let msg = Paragraph::new(vec![
            Line::from(Span::styled(
                "Leaderboard not found",
                Style::default().fg(app.theme.error).bold(),
            )),
            Line::from(Span::styled(
                "It may have been deleted. Press q to quit.",
                Style::default().fg(app.theme.muted),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(msg, centered_rect_fixed(area.width, 2, area));
        return;
    }

    let Some(standings) = &app.standings else {
        return;
    };

    if standings.is_empty() {
        let text = match standings {
            Standings::Board { .. } => "No entries yet",
            Standings::Golf { .. } => "No submissions yet! Be the first to solve the challenge!",
        };
        let empty_msg = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted))
            .block(Block::default());
        frame.render_widget(empty_msg, centered_rect_fixed(area.width, 1, area));
        return;
    }

    let now = Utc::now();
    let theme = &app.theme;

    let (header, widths, rows): (Vec<String>, Vec<Constraint>, Vec<Row>) = match standings {
        Standings::Board { leaderboard, entries } => {
            let metric = leaderboard.scoring_type.metric();
            let rows = entries
                .iter()
                .enumerate()
                .map(|(idx, ranked)| {
                    let entry = &ranked.item;
                    let podium = theme.podium_style(ranked.rank);
                    let stamp = entry.updated_at.unwrap_or(entry.created_at);
                    Row::new(vec![
                        rank_cell(ranked.rank, podium, theme.rank_color),
                        Cell::from(entry.team_name.clone()).style(podium.unwrap_or_default()),
                        Cell::from(
                            Line::from(format_score(entry.score, metric, &app.locale)).alignment(Alignment::Right),
                        )
                        .style(Style::default().fg(theme.score_color)),
                        Cell::from(format_relative_age(stamp, now)).style(Style::default().fg(theme.muted)),
                    ])
                    .style(alternate_bg(idx, theme.row_alt_bg))
                })
                .collect();
            (
                vec![
                    "Rank".to_string(),
                    "Team".to_string(),
                    leaderboard.score_label.clone(),
                    "Updated".to_string(),
                ],
                vec![
                    Constraint::Length(6),
                    Constraint::Fill(1),
                    Constraint::Length(16),
                    Constraint::Length(12),
                ],
                rows,
            )
        }
        Standings::Golf { submissions } => {
            let rows = submissions
                .iter()
                .enumerate()
                .map(|(idx, ranked)| {
                    let sub = &ranked.item;
                    let podium = theme.podium_style(ranked.rank);
                    Row::new(vec![
                        rank_cell(ranked.rank, podium, theme.rank_color),
                        Cell::from(sub.team_label()).style(podium.unwrap_or_default()),
                        Cell::from(Line::from(sub.character_count.to_string()).alignment(Alignment::Right))
                            .style(Style::default().fg(theme.score_color)),
                        Cell::from(Line::from(format_duration(sub.solve_time_seconds)).alignment(Alignment::Right)),
                        Cell::from(format_relative_age(sub.created_at, now)).style(Style::default().fg(theme.muted)),
                    ])
                    .style(alternate_bg(idx, theme.row_alt_bg))
                })
                .collect();
            (
                vec![
                    "Rank".to_string(),
                    "Team".to_string(),
                    "Chars".to_string(),
                    "Time".to_string(),
                    "Submitted".to_string(),
                ],
                vec![
                    Constraint::Length(6),
                    Constraint::Fill(1),
                    Constraint::Length(7),
                    Constraint::Length(10),
                    Constraint::Length(12),
                ],
                rows,
            )
        }
    };

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(theme.header_style).bottom_margin(1))
        .column_spacing(2)
        .row_highlight_style(theme.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn rank_cell(rank: usize, podium: Option<Style>, plain: Color) -> Cell<'static> {
    let label = if rank <= 3 {
        format!("{} {}", rank_badge(rank), rank)
    } else {
        format!("   {}", rank)
    };
    Cell::from(label).style(podium.unwrap_or_else(|| Style::default().fg(plain)))
}

fn alternate_bg(idx: usize, bg: Color) -> Style {
    if idx % 2 == 1 {
        Style::default().bg(bg)
    } else {
        Style::default()
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Failed") || msg.starts_with("Refresh failed") {
            theme.flash_error
        } else {
            theme.flash_success
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let mut spans = Vec::new();

        let count = match &app.standings {
            Some(Standings::Golf { .. }) => format!("{} submissions", app.row_count()),
            _ => format!("{} teams", app.row_count()),
        };
        spans.push(Span::styled(count, Style::default().fg(theme.muted)));

        if let Some(at) = app.last_refresh {
            let age = format_relative_age(at, Utc::now());
            let label = if app.stale {
                format!("  cached {}", age.to_lowercase())
            } else {
                format!("  updated {}", age.to_lowercase())
            };
            spans.push(Span::styled(label, Style::default().fg(theme.muted)));
        }
        spans.push(Span::styled(
            format!("  Auto-refreshes every {} seconds  ", app.refresh_interval.as_secs()),
            Style::default().fg(theme.muted),
        ));

        let hints = [("j/k", ":nav "), ("o", ":open "), ("r", ":refresh "), ("?", ":help "), ("q", ":quit")];
        for (key, label) in hints {
            spans.push(Span::styled(key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area,
    );
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect { x, y, width, height }
}

fn render_help_popup(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(46, 11, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(Span::styled(" Keyboard Shortcuts ", app.theme.popup_title))
        .border_style(Style::default().fg(app.theme.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let key_style = Style::default().fg(app.theme.status_key_color).bold();
    let shortcuts = [
        ("j / Down      ", "Move down"),
        ("k / Up        ", "Move up"),
        ("Enter / o     ", "Open board page in browser"),
        ("r             ", "Refresh now"),
        ("?             ", "Show/hide this help"),
        ("q / Ctrl-c    ", "Quit"),
    ];
    let mut help_lines: Vec<Line> = shortcuts
        .iter()
        .map(|(key, action)| Line::from(vec![Span::styled(*key, key_style), Span::raw(*action)]))
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(app.theme.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}

fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(30, 3, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered();
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    // Braille spinner animation
    let spinner_chars = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let loading_text = Paragraph::new(format!("{} Loading standings...", spinner))
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.title_color));
    frame.render_widget(loading_text, inner);
}
