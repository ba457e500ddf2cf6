use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way scores compare. Attached to the leaderboard, never to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// What a score measures. Only affects display, never comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Points,
    Time,
}

/// Scoring policy of a leaderboard, as stored by the data service.
///
/// Example YAML / JSON value: `points_high`, `points_low`, `time_fast`, `time_slow`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Points, high score wins
    #[default]
    PointsHigh,
    /// Points, low score wins
    PointsLow,
    /// Time, fastest wins
    TimeFast,
    /// Time, longest wins
    TimeSlow,
}

impl ScoringPolicy {
    pub fn direction(self) -> Direction {
        match self {
            ScoringPolicy::PointsHigh | ScoringPolicy::TimeSlow => Direction::HigherIsBetter,
            ScoringPolicy::PointsLow | ScoringPolicy::TimeFast => Direction::LowerIsBetter,
        }
    }

    pub fn metric(self) -> Metric {
        match self {
            ScoringPolicy::PointsHigh | ScoringPolicy::PointsLow => Metric::Points,
            ScoringPolicy::TimeFast | ScoringPolicy::TimeSlow => Metric::Time,
        }
    }

    /// Label used when a leaderboard is saved with a blank score label
    pub fn default_label(self) -> &'static str {
        match self.metric() {
            Metric::Points => "Points",
            Metric::Time => "Time",
        }
    }

    /// Wire name, e.g. "time_fast"
    pub fn as_str(self) -> &'static str {
        match self {
            ScoringPolicy::PointsHigh => "points_high",
            ScoringPolicy::PointsLow => "points_low",
            ScoringPolicy::TimeFast => "time_fast",
            ScoringPolicy::TimeSlow => "time_slow",
        }
    }

    /// Human description shown next to the selector in `create`
    pub fn describe(self) -> &'static str {
        match self {
            ScoringPolicy::PointsHigh => "Points (High Score Wins)",
            ScoringPolicy::PointsLow => "Points (Low Score Wins)",
            ScoringPolicy::TimeFast => "Time (Fastest Wins)",
            ScoringPolicy::TimeSlow => "Time (Longest Wins)",
        }
    }
}

impl fmt::Display for ScoringPolicy {
    /// Listing form: the wire name with its first underscore replaced, "points high"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().replacen('_', " ", 1))
    }
}
