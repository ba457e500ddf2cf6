use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::backend::types::{Entry, Leaderboard, Submission};
use crate::ranking::{Metric, Ranked};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Resolve a locale name such as "en" or "de", falling back to "en"
pub fn resolve_locale(name: &str) -> Locale {
    Locale::from_name(name).unwrap_or(Locale::en)
}

/// Format a score for display according to what it measures
pub fn format_score(score: f64, metric: Metric, locale: &Locale) -> String {
    match metric {
        Metric::Time => format_duration(Some(score)),
        Metric::Points => format_points(score, locale),
    }
}

/// Format seconds as "m:ss" when at least a minute, "Ns" otherwise, "N/A" when absent.
///
/// Fractional seconds keep their natural representation (to millisecond
/// precision): 65.5 -> "1:05.5", 7.25 -> "7.25s".
pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds else {
        return "N/A".to_string();
    };
    // Round before splitting so the seconds part never reaches 60
    let seconds = trim_noise(seconds);

    let minutes = (seconds / 60.0).floor();
    if minutes > 0.0 {
        let rest = trim_noise(seconds - minutes * 60.0);
        let rest_str = natural(rest);
        let padded = if rest < 10.0 {
            format!("0{}", rest_str)
        } else {
            rest_str
        };
        format!("{}:{}", minutes as u64, padded)
    } else {
        format!("{}s", natural(seconds))
    }
}

/// Format a number with the locale's digit grouping, e.g. 1234567 -> "1,234,567".
/// The fractional part is kept as-is, never truncated.
pub fn format_points(score: f64, locale: &Locale) -> String {
    if !score.is_finite() {
        return score.to_string();
    }

    let magnitude = natural(score.abs());
    let (int_part, frac_part) = match magnitude.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (magnitude.as_str(), None),
    };

    let grouped = match int_part.parse::<u128>() {
        Ok(n) => n.to_formatted_string(locale),
        Err(_) => int_part.to_string(),
    };

    let mut out = String::new();
    if score < 0.0 {
        out.push_str(locale.minus_sign());
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push_str(locale.decimal());
        out.push_str(frac);
    }
    out
}

/// Coarse age of a timestamp: "Just now", "5m ago", "3h ago", "2d ago".
/// Each tier floors; timestamps in the future read as "Just now".
pub fn format_relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

/// Medal for the podium, the plain number below it
pub fn rank_badge(rank: usize) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => n.to_string(),
    }
}

/// Shortest round-trip representation; f64 Display never uses exponents
fn natural(value: f64) -> String {
    format!("{}", value)
}

/// Drop binary noise such as 1.0999999999999943 left over from subtraction
fn trim_noise(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
pub fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn fit_name(name: &str, fixed_width: usize, term_width: Option<usize>) -> String {
    match term_width {
        Some(width) if width > fixed_width + 10 => truncate_text(name, width - fixed_width),
        Some(_) => truncate_text(name, 20),
        None => name.to_string(),
    }
}

/// Format ranked entries as a table: rank, score, team, submitted.
/// No headers; scores right-aligned to the widest one.
pub fn format_board_table(
    board: &Leaderboard,
    entries: &[Ranked<Entry>],
    locale: &Locale,
    now: DateTime<Utc>,
    use_colors: bool,
) -> String {
    if entries.is_empty() {
        return "No entries yet.".to_string();
    }

    let metric = board.scoring_type.metric();
    let scores: Vec<String> = entries
        .iter()
        .map(|r| format_score(r.item.score, metric, locale))
        .collect();
    let score_width = scores.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    let ages: Vec<String> = entries
        .iter()
        .map(|r| format_relative_age(r.item.created_at, now))
        .collect();
    let age_width = ages.iter().map(|s| s.len()).max().unwrap_or(0);

    let term_width = get_terminal_width();
    let separator = "  ";
    let fixed_width = 4 + score_width + separator.len() * 2 + age_width;

    entries
        .iter()
        .zip(scores.iter().zip(ages.iter()))
        .map(|(ranked, (score, age))| {
            let index_str = format!("{:>3}.", ranked.rank);
            let score_padded = format!("{:>width$}", score, width = score_width);
            let team = fit_name(&ranked.item.team_name, fixed_width, term_width);
            let age_padded = format!("{:>width$}", age, width = age_width);

            if use_colors {
                let score_cell = if ranked.rank <= 3 {
                    score_padded.yellow().bold().to_string()
                } else {
                    score_padded.green().to_string()
                };
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    score_cell,
                    separator,
                    team.bold(),
                    separator,
                    age_padded.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, score_padded, separator, team, separator, age_padded
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format code-golf standings: rank, team, characters, solve time, submitted
pub fn format_golf_table(submissions: &[Ranked<Submission>], now: DateTime<Utc>, use_colors: bool) -> String {
    if submissions.is_empty() {
        return "No submissions yet! Be the first to solve the challenge!".to_string();
    }

    let labels: Vec<String> = submissions.iter().map(|r| r.item.team_label()).collect();
    let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(0);

    submissions
        .iter()
        .zip(labels.iter())
        .map(|(ranked, label)| {
            let index_str = format!("{:>3}.", ranked.rank);
            let chars = format!("{:>5} chars", ranked.item.character_count);
            let time = format!("{:>7}", format_duration(ranked.item.solve_time_seconds));
            let age = format_relative_age(ranked.item.created_at, now);
            let label = format!("{:<width$}", label, width = label_width);

            if use_colors {
                format!(
                    "{} {}  {}  {}  {}",
                    index_str.dimmed(),
                    label.bold(),
                    chars.green(),
                    time.yellow(),
                    age.dimmed()
                )
            } else {
                format!("{} {}  {}  {}  {}", index_str, label, chars, time, age)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tab-separated ranking for scripting.
/// Columns: rank, team, score, created_at (no headers, no colors)
pub fn format_board_tsv(entries: &[Ranked<Entry>]) -> String {
    entries
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}",
                r.rank,
                r.item.team_name,
                r.item.score,
                r.item.created_at.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Columns: rank, team, characters, solve seconds (empty when absent), created_at
pub fn format_golf_tsv(submissions: &[Ranked<Submission>]) -> String {
    submissions
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                r.rank,
                r.item.team_label(),
                r.item.character_count,
                r.item.solve_time_seconds.map(|s| s.to_string()).unwrap_or_default(),
                r.item.created_at.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Landing listing of leaderboards with their entry counts
pub fn format_board_list(boards: &[(Leaderboard, Option<u64>)], use_colors: bool) -> String {
    if boards.is_empty() {
        return "No leaderboards yet. Create one with `scoreboard create --name <name>`.".to_string();
    }

    boards
        .iter()
        .map(|(board, count)| {
            let count_str = match count {
                Some(1) => "1 entry".to_string(),
                Some(n) => format!("{} entries", n),
                None => "? entries".to_string(),
            };
            let mut header = if use_colors {
                format!(
                    "{:>3}. {}  [{}]  {}",
                    board.id,
                    board.name.bold(),
                    board.scoring_type.cyan(),
                    count_str.dimmed()
                )
            } else {
                format!(
                    "{:>3}. {}  [{}]  {}",
                    board.id, board.name, board.scoring_type, count_str
                )
            };
            if !board.is_active {
                header.push_str("  (inactive)");
            }
            match &board.description {
                Some(desc) => format!("{}\n     {}", header, desc),
                None => header,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::{rank_for_policy, rank_submissions, ScoringPolicy};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn board(policy: ScoringPolicy) -> Leaderboard {
        Leaderboard {
            id: 3,
            name: "Trivia Night".to_string(),
            description: Some("Test your tech knowledge!".to_string()),
            scoring_type: policy,
            score_label: policy.default_label().to_string(),
            allow_updates: false,
            is_active: true,
            created_at: now() - Duration::days(1),
        }
    }

    fn entry(id: &str, team: &str, score: f64, minutes_ago: i64) -> Entry {
        Entry {
            id: id.to_string(),
            leaderboard_id: 3,
            team_name: team.to_string(),
            score,
            metadata: Default::default(),
            created_at: now() - Duration::minutes(minutes_ago),
            updated_at: None,
        }
    }

    // format_duration
    #[test]
    fn test_duration_zero() {
        assert_eq!(format_duration(Some(0.0)), "0s");
    }

    #[test]
    fn test_duration_over_a_minute() {
        assert_eq!(format_duration(Some(65.0)), "1:05");
        assert_eq!(format_duration(Some(600.0)), "10:00");
        assert_eq!(format_duration(Some(119.0)), "1:59");
    }

    #[test]
    fn test_duration_under_a_minute() {
        assert_eq!(format_duration(Some(45.0)), "45s");
        assert_eq!(format_duration(Some(7.25)), "7.25s");
    }

    #[test]
    fn test_duration_fraction_kept() {
        assert_eq!(format_duration(Some(65.5)), "1:05.5");
        assert_eq!(format_duration(Some(61.1)), "1:01.1");
    }

    #[test]
    fn test_duration_rounding_carries_into_minutes() {
        assert_eq!(format_duration(Some(119.9996)), "2:00");
        assert_eq!(format_duration(Some(59.9996)), "1:00");
        assert_eq!(format_duration(Some(59.9994)), "59.999s");
    }

    #[test]
    fn test_duration_absent() {
        assert_eq!(format_duration(None), "N/A");
    }

    // format_points
    #[test]
    fn test_points_grouped() {
        assert_eq!(format_points(1_234_567.0, &Locale::en), "1,234,567");
        assert_eq!(format_points(999.0, &Locale::en), "999");
        assert_eq!(format_points(0.0, &Locale::en), "0");
    }

    #[test]
    fn test_points_fraction_and_sign() {
        assert_eq!(format_points(1234.5, &Locale::en), "1,234.5");
        assert_eq!(format_points(-1500.25, &Locale::en), "-1,500.25");
        assert_eq!(format_points(-0.5, &Locale::en), "-0.5");
    }

    #[test]
    fn test_points_other_locale() {
        assert_eq!(format_points(1_234_567.5, &Locale::de), "1.234.567,5");
    }

    #[test]
    fn test_format_score_dispatches_on_metric() {
        assert_eq!(format_score(65.0, Metric::Time, &Locale::en), "1:05");
        assert_eq!(format_score(65000.0, Metric::Points, &Locale::en), "65,000");
    }

    #[test]
    fn test_resolve_locale_falls_back() {
        assert_eq!(resolve_locale("not-a-locale").name(), "en");
    }

    // format_relative_age
    #[test]
    fn test_relative_age_tiers() {
        assert_eq!(format_relative_age(now() - Duration::seconds(30), now()), "Just now");
        assert_eq!(format_relative_age(now() - Duration::minutes(5), now()), "5m ago");
        assert_eq!(format_relative_age(now() - Duration::hours(3), now()), "3h ago");
        assert_eq!(format_relative_age(now() - Duration::days(2), now()), "2d ago");
    }

    #[test]
    fn test_relative_age_floors_at_boundaries() {
        assert_eq!(format_relative_age(now() - Duration::seconds(119), now()), "1m ago");
        assert_eq!(format_relative_age(now() - Duration::minutes(59), now()), "59m ago");
        assert_eq!(format_relative_age(now() - Duration::minutes(60), now()), "1h ago");
        assert_eq!(format_relative_age(now() - Duration::minutes(1439), now()), "23h ago");
        assert_eq!(format_relative_age(now() - Duration::hours(47), now()), "1d ago");
    }

    #[test]
    fn test_relative_age_future_is_just_now() {
        assert_eq!(format_relative_age(now() + Duration::minutes(3), now()), "Just now");
    }

    #[test]
    fn test_rank_badge() {
        assert_eq!(rank_badge(1), "🥇");
        assert_eq!(rank_badge(3), "🥉");
        assert_eq!(rank_badge(4), "4");
    }

    // truncate_text
    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Short", 20), "Short");
        assert_eq!(truncate_text("This is a very long name", 15), "This is a ve...");
        assert_eq!(truncate_text("Hello world", 3), "Hel");
    }

    // tables
    #[test]
    fn test_board_table_empty() {
        let result = format_board_table(&board(ScoringPolicy::PointsHigh), &[], &Locale::en, now(), false);
        assert_eq!(result, "No entries yet.");
    }

    #[test]
    fn test_board_table_rows() {
        let ranked = rank_for_policy(
            vec![
                entry("a", "Late Tie", 100.0, 10),
                entry("b", "Early Tie", 100.0, 20),
                entry("c", "Third", 1500.0, 200),
            ],
            ScoringPolicy::PointsLow,
        );
        let result = format_board_table(&board(ScoringPolicy::PointsLow), &ranked, &Locale::en, now(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  1."));
        assert!(lines[0].contains("Early Tie"));
        assert!(lines[0].contains("20m ago"));
        assert!(lines[1].contains("Late Tie"));
        assert!(lines[2].contains("1,500"));
        assert!(lines[2].contains("3h ago"));
    }

    #[test]
    fn test_board_table_time_scores() {
        let ranked = rank_for_policy(vec![entry("a", "Speedy", 65.0, 1)], ScoringPolicy::TimeFast);
        let result = format_board_table(&board(ScoringPolicy::TimeFast), &ranked, &Locale::en, now(), false);
        assert!(result.contains("1:05"));
    }

    #[test]
    fn test_board_tsv() {
        let ranked = rank_for_policy(
            vec![entry("a", "Alpha", 10.0, 0), entry("b", "Beta", 20.5, 0)],
            ScoringPolicy::PointsHigh,
        );
        let tsv = format_board_tsv(&ranked);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0].split('\t').collect::<Vec<_>>()[..3], ["1", "Beta", "20.5"]);
        assert!(lines[1].starts_with("2\tAlpha\t10\t"));
    }

    fn submission(id: &str, team: u32, chars: u32, solve: Option<f64>) -> Submission {
        Submission {
            id: id.to_string(),
            category: 1,
            team_number: team,
            language: "javascript".to_string(),
            code: String::new(),
            character_count: chars,
            solve_time_seconds: solve,
            is_valid: true,
            created_at: now() - Duration::minutes(5),
        }
    }

    #[test]
    fn test_golf_table() {
        let ranked = rank_submissions(vec![
            submission("a", 4, 90, Some(125.0)),
            submission("b", 12, 64, None),
        ]);
        let result = format_golf_table(&ranked, now(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert!(lines[0].contains("cat-1-team-12"));
        assert!(lines[0].contains("64 chars"));
        assert!(lines[0].contains("N/A"));
        assert!(lines[1].contains("2:05"));
        assert!(lines[1].contains("5m ago"));
    }

    #[test]
    fn test_golf_table_empty() {
        assert!(format_golf_table(&[], now(), false).starts_with("No submissions yet!"));
    }

    #[test]
    fn test_golf_tsv_blank_time() {
        let ranked = rank_submissions(vec![submission("a", 4, 90, None)]);
        assert!(format_golf_tsv(&ranked).starts_with("1\tcat-1-team-4\t90\t\t"));
    }

    #[test]
    fn test_board_list() {
        let mut inactive = board(ScoringPolicy::TimeFast);
        inactive.id = 4;
        inactive.description = None;
        inactive.is_active = false;
        let result = format_board_list(&[(board(ScoringPolicy::PointsHigh), Some(12)), (inactive, None)], false);
        assert!(result.contains("  3. Trivia Night  [points high]  12 entries"));
        assert!(result.contains("     Test your tech knowledge!"));
        assert!(result.contains("[time fast]  ? entries  (inactive)"));
    }

    #[test]
    fn test_board_list_empty() {
        assert!(format_board_list(&[], false).starts_with("No leaderboards yet."));
    }
}
